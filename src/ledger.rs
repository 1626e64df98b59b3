//! Derived views over a trip: net balances, due-soon alerts, spending
//! totals. Everything recomputes from the expense log on each call;
//! nothing here caches or mutates.

use std::collections::HashMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{Category, Expense, PaymentMethod};
use crate::trip::Trip;

/// Equal split of `amount` across `participant_count` heads. The split
/// policy lives here and nowhere else. `participant_count` must be
/// non-zero; rosters are never empty.
pub fn equal_share(amount: Decimal, participant_count: usize) -> Decimal {
    amount / Decimal::from(participant_count as u64)
}

/// Net position per responsible party. Positive means the trip owes them,
/// negative means they still owe. Every root appears, zero when even, and
/// the values always sum to exactly zero: each unsettled portion debits
/// one root and credits another by the same share.
pub fn net_balances(trip: &Trip) -> HashMap<String, Decimal> {
    let roster = trip.roster();
    let mut balances: HashMap<String, Decimal> = roster
        .roots()
        .into_iter()
        .map(|root| (root.to_string(), Decimal::ZERO))
        .collect();
    for expense in trip.expenses() {
        let share = equal_share(expense.amount, roster.len());
        let payer_root = roster.resolve_known(&expense.payer);
        for participant in roster.participants() {
            if expense.settled_by.contains(participant) {
                continue;
            }
            let root = roster.resolve_known(participant);
            if root == payer_root {
                continue;
            }
            *balances.entry(root.to_string()).or_insert(Decimal::ZERO) -= share;
            *balances
                .entry(payer_root.to_string())
                .or_insert(Decimal::ZERO) += share;
        }
    }
    balances
}

/// Credit expenses whose due date falls inside `[today, today + window_days]`
/// and which still have someone pending, paired with days remaining.
/// Soonest first; ties keep recording order. Recomputed per call.
pub fn due_soon_alerts<'a>(
    trip: &'a Trip,
    today: NaiveDate,
    window_days: i64,
) -> Vec<(&'a Expense, i64)> {
    let roster_len = trip.roster().len();
    let mut alerts: Vec<(&Expense, i64)> = trip
        .expenses()
        .iter()
        .filter(|e| e.method == PaymentMethod::Credit)
        .filter(|e| e.settled_by.len() < roster_len)
        .filter_map(|e| {
            let due = e.due_date?;
            let days_left = (due - today).num_days();
            (0..=window_days).contains(&days_left).then_some((e, days_left))
        })
        .collect();
    alerts.sort_by_key(|(e, _)| e.due_date);
    alerts
}

/// Total fronted across the whole trip.
pub fn total_spent(trip: &Trip) -> Decimal {
    trip.expenses().iter().map(|e| e.amount).sum()
}

/// Spend per category; only categories with at least one expense appear.
pub fn totals_by_category(trip: &Trip) -> HashMap<Category, Decimal> {
    let mut totals = HashMap::new();
    for e in trip.expenses() {
        *totals.entry(e.category).or_insert(Decimal::ZERO) += e.amount;
    }
    totals
}

/// Amount fronted per payer.
pub fn totals_by_payer(trip: &Trip) -> HashMap<String, Decimal> {
    let mut totals = HashMap::new();
    for e in trip.expenses() {
        *totals.entry(e.payer.clone()).or_insert(Decimal::ZERO) += e.amount;
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::Roster;
    use rust_decimal_macros::dec;

    fn trio() -> Trip {
        let roster = Roster::new(
            vec!["ana".into(), "bruno".into(), "carla".into()],
            HashMap::new(),
        )
        .expect("roster");
        Trip::new(roster)
    }

    fn record(
        trip: &mut Trip,
        amount: Decimal,
        payer: &str,
        method: PaymentMethod,
        due: Option<&str>,
    ) -> crate::models::ExpenseId {
        let due_date = due.map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").expect("date"));
        trip.record_expense("gasto", Category::Food, amount, payer, method, due_date)
            .expect("record")
    }

    #[test]
    fn share_is_amount_over_headcount() {
        assert_eq!(equal_share(dec!(90), 3), dec!(30));
        assert_eq!(equal_share(dec!(40), 4), dec!(10));
    }

    #[test]
    fn ninety_split_three_ways() {
        let mut trip = trio();
        let id = record(&mut trip, dec!(90), "ana", PaymentMethod::Cash, None);

        let balances = net_balances(&trip);
        assert_eq!(balances["ana"], dec!(60));
        assert_eq!(balances["bruno"], dec!(-30));
        assert_eq!(balances["carla"], dec!(-30));

        trip.settle_portion(id, "bruno").expect("settle");
        let balances = net_balances(&trip);
        assert_eq!(balances["ana"], dec!(30));
        assert_eq!(balances["bruno"], dec!(0));
        assert_eq!(balances["carla"], dec!(-30));
    }

    #[test]
    fn dependents_debt_lands_on_their_root() {
        let mut map = HashMap::new();
        map.insert("diego".to_string(), "ana".to_string());
        let roster = Roster::new(
            vec!["ana".into(), "bruno".into(), "carla".into(), "diego".into()],
            map,
        )
        .expect("roster");
        let mut trip = Trip::new(roster);
        record(&mut trip, dec!(40), "ana", PaymentMethod::Cash, None);

        let balances = net_balances(&trip);
        assert_eq!(balances.len(), 3); // diego is nobody's creditor or debtor
        assert_eq!(balances["ana"], dec!(20));
        assert_eq!(balances["bruno"], dec!(-10));
        assert_eq!(balances["carla"], dec!(-10));
    }

    #[test]
    fn credit_for_a_dependents_payment_accrues_to_their_root() {
        let mut map = HashMap::new();
        map.insert("diego".to_string(), "ana".to_string());
        let roster = Roster::new(
            vec!["ana".into(), "bruno".into(), "carla".into(), "diego".into()],
            map,
        )
        .expect("roster");
        let mut trip = Trip::new(roster);
        // diego fronts the money, but ana answers for him
        record(&mut trip, dec!(40), "diego", PaymentMethod::Cash, None);

        let balances = net_balances(&trip);
        assert_eq!(balances["ana"], dec!(20)); // bruno and carla owe ana, not diego
        assert_eq!(balances["bruno"], dec!(-10));
        assert_eq!(balances["carla"], dec!(-10));
        assert!(!balances.contains_key("diego"));
    }

    #[test]
    fn unsettled_dependent_debits_their_root() {
        let mut map = HashMap::new();
        map.insert("diego".to_string(), "carla".to_string());
        let roster = Roster::new(
            vec!["ana".into(), "bruno".into(), "carla".into(), "diego".into()],
            map,
        )
        .expect("roster");
        let mut trip = Trip::new(roster);
        record(&mut trip, dec!(40), "ana", PaymentMethod::Cash, None);

        // carla owes her own share plus diego's
        let balances = net_balances(&trip);
        assert_eq!(balances["ana"], dec!(30));
        assert_eq!(balances["bruno"], dec!(-10));
        assert_eq!(balances["carla"], dec!(-20));
    }

    #[test]
    fn balances_sum_to_zero_even_on_uneven_splits() {
        let mut trip = trio();
        let id = record(&mut trip, dec!(100), "ana", PaymentMethod::Cash, None);
        record(&mut trip, dec!(7), "bruno", PaymentMethod::Cash, None);

        let sum: Decimal = net_balances(&trip).values().copied().sum();
        assert_eq!(sum, Decimal::ZERO);

        trip.settle_portion(id, "carla").expect("settle");
        let sum: Decimal = net_balances(&trip).values().copied().sum();
        assert_eq!(sum, Decimal::ZERO);
    }

    #[test]
    fn every_root_appears_even_with_no_expenses() {
        let trip = trio();
        let balances = net_balances(&trip);
        assert_eq!(balances.len(), 3);
        assert!(balances.values().all(|b| *b == Decimal::ZERO));
    }

    #[test]
    fn recording_order_does_not_change_balances() {
        let mut forward = trio();
        record(&mut forward, dec!(90), "ana", PaymentMethod::Cash, None);
        record(&mut forward, dec!(30), "bruno", PaymentMethod::Cash, None);

        let mut reverse = trio();
        record(&mut reverse, dec!(30), "bruno", PaymentMethod::Cash, None);
        record(&mut reverse, dec!(90), "ana", PaymentMethod::Cash, None);

        assert_eq!(net_balances(&forward), net_balances(&reverse));
    }

    #[test]
    fn fully_settled_trip_balances_out() {
        let mut trip = trio();
        let id = record(&mut trip, dec!(90), "ana", PaymentMethod::Cash, None);
        trip.settle_portion(id, "bruno").expect("settle");
        trip.settle_portion(id, "carla").expect("settle");
        assert!(net_balances(&trip).values().all(|b| *b == Decimal::ZERO));
    }

    #[test]
    fn settling_a_fully_settled_expense_changes_no_balance() {
        let mut trip = trio();
        let id = record(&mut trip, dec!(90), "ana", PaymentMethod::Cash, None);
        trip.settle_portion(id, "bruno").expect("settle");
        trip.settle_portion(id, "carla").expect("settle");

        let before = net_balances(&trip);
        trip.settle_portion(id, "carla").expect_err("already settled");
        assert_eq!(net_balances(&trip), before);
    }

    #[test]
    fn due_soon_keeps_window_and_order() {
        let mut trip = trio();
        let today = NaiveDate::parse_from_str("2024-05-01", "%Y-%m-%d").expect("date");

        let on_edge = record(
            &mut trip,
            dec!(50),
            "ana",
            PaymentMethod::Credit,
            Some("2024-05-04"),
        );
        let today_due = record(
            &mut trip,
            dec!(20),
            "ana",
            PaymentMethod::Credit,
            Some("2024-05-01"),
        );
        // outside the window
        record(
            &mut trip,
            dec!(10),
            "ana",
            PaymentMethod::Credit,
            Some("2024-05-05"),
        );
        // already past due
        record(
            &mut trip,
            dec!(10),
            "ana",
            PaymentMethod::Credit,
            Some("2024-04-30"),
        );
        // wrong method
        record(
            &mut trip,
            dec!(10),
            "ana",
            PaymentMethod::Cash,
            Some("2024-05-02"),
        );
        // no due date
        record(&mut trip, dec!(10), "ana", PaymentMethod::Credit, None);

        let alerts = due_soon_alerts(&trip, today, 3);
        let got: Vec<(crate::models::ExpenseId, i64)> =
            alerts.iter().map(|(e, days)| (e.id, *days)).collect();
        assert_eq!(got, vec![(today_due, 0), (on_edge, 3)]);
    }

    #[test]
    fn fully_settled_credit_expenses_never_alert() {
        let mut trip = trio();
        let today = NaiveDate::parse_from_str("2024-05-01", "%Y-%m-%d").expect("date");
        let id = record(
            &mut trip,
            dec!(60),
            "ana",
            PaymentMethod::Credit,
            Some("2024-05-02"),
        );
        assert_eq!(due_soon_alerts(&trip, today, 3).len(), 1);

        trip.settle_portion(id, "bruno").expect("settle");
        trip.settle_portion(id, "carla").expect("settle");
        assert!(due_soon_alerts(&trip, today, 3).is_empty());
    }

    #[test]
    fn due_date_ties_keep_recording_order() {
        let mut trip = trio();
        let today = NaiveDate::parse_from_str("2024-05-01", "%Y-%m-%d").expect("date");
        let first = record(
            &mut trip,
            dec!(10),
            "ana",
            PaymentMethod::Credit,
            Some("2024-05-02"),
        );
        let second = record(
            &mut trip,
            dec!(20),
            "bruno",
            PaymentMethod::Credit,
            Some("2024-05-02"),
        );
        let ids: Vec<crate::models::ExpenseId> = due_soon_alerts(&trip, today, 3)
            .iter()
            .map(|(e, _)| e.id)
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn report_totals_cover_the_whole_ledger() {
        let mut trip = trio();
        record(&mut trip, dec!(90), "ana", PaymentMethod::Cash, None);
        trip.record_expense(
            "táxi",
            Category::Transport,
            dec!(30),
            "bruno",
            PaymentMethod::InstantTransfer,
            None,
        )
        .expect("record");
        trip.record_expense(
            "pousada",
            Category::Lodging,
            dec!(180),
            "ana",
            PaymentMethod::Credit,
            None,
        )
        .expect("record");

        assert_eq!(total_spent(&trip), dec!(300));

        let by_category = totals_by_category(&trip);
        assert_eq!(by_category[&Category::Food], dec!(90));
        assert_eq!(by_category[&Category::Transport], dec!(30));
        assert_eq!(by_category[&Category::Lodging], dec!(180));
        assert_eq!(by_category.len(), 3);

        let by_payer = totals_by_payer(&trip);
        assert_eq!(by_payer["ana"], dec!(270));
        assert_eq!(by_payer["bruno"], dec!(30));

        let category_sum: Decimal = by_category.values().copied().sum();
        let payer_sum: Decimal = by_payer.values().copied().sum();
        assert_eq!(category_sum, total_spent(&trip));
        assert_eq!(payer_sum, total_spent(&trip));
    }
}

//! Participant roster and the responsibility map (who answers for whom).

use std::collections::HashMap;

use crate::error::{LedgerError, LedgerResult};

/// The fixed set of trip participants plus a participant -> responsible
/// party map. The map must be a star: applying it twice lands on the same
/// name as applying it once, so a dependent can never answer for anyone.
/// Validated once here; participants cannot be added or renamed later.
#[derive(Clone, Debug, PartialEq)]
pub struct Roster {
    names: Vec<String>,
    responsible: HashMap<String, String>,
}

impl Roster {
    pub fn new(
        participants: Vec<String>,
        responsibility: HashMap<String, String>,
    ) -> LedgerResult<Self> {
        if participants.is_empty() {
            return Err(LedgerError::EmptyRoster);
        }
        let mut names: Vec<String> = Vec::with_capacity(participants.len());
        for name in participants {
            if names.contains(&name) {
                return Err(LedgerError::DuplicateParticipant(name));
            }
            names.push(name);
        }
        for (participant, responsible) in &responsibility {
            if !names.contains(participant) {
                return Err(LedgerError::UnknownParticipant(participant.clone()));
            }
            if !names.contains(responsible) {
                return Err(LedgerError::UnknownParticipant(responsible.clone()));
            }
        }
        // Anyone absent from the map answers for themselves.
        let mut responsible = responsibility;
        for name in &names {
            responsible
                .entry(name.clone())
                .or_insert_with(|| name.clone());
        }
        // Star check, in roster order so the reported pair is deterministic.
        for name in &names {
            if let Some(resp) = responsible.get(name) {
                let next = responsible.get(resp).unwrap_or(resp);
                if next != resp {
                    return Err(LedgerError::InvalidResponsibilityMap {
                        participant: name.clone(),
                        responsible: resp.clone(),
                    });
                }
            }
        }
        let roots = names
            .iter()
            .filter(|n| responsible.get(*n) == Some(*n))
            .count();
        tracing::info!("roster built: {} participants, {} roots", names.len(), roots);
        Ok(Roster { names, responsible })
    }

    /// The party who answers for `name`'s share (`name` itself for roots).
    pub fn resolve(&self, name: &str) -> LedgerResult<&str> {
        self.responsible
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| LedgerError::UnknownParticipant(name.to_string()))
    }

    /// Resolve for names already validated against this roster.
    pub(crate) fn resolve_known<'a>(&'a self, name: &'a str) -> &'a str {
        self.responsible
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }

    pub fn is_root(&self, name: &str) -> LedgerResult<bool> {
        Ok(self.resolve(name)? == name)
    }

    /// Financially responsible parties, in roster order.
    pub fn roots(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter(|n| self.resolve_known(n) == n.as_str())
            .map(String::as_str)
            .collect()
    }

    /// Everyone whose share `name`'s responsible party answers for,
    /// including that party itself. Roster order.
    pub fn responsibility_group(&self, name: &str) -> LedgerResult<Vec<&str>> {
        let root = self.resolve(name)?;
        Ok(self
            .names
            .iter()
            .filter(|n| self.resolve_known(n) == root)
            .map(String::as_str)
            .collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.responsible.contains_key(name)
    }

    /// Participants in setup order.
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

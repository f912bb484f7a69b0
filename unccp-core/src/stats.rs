use crate::domain::Outcome;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub entries: u64,
    pub decompiled: u64,
    pub skipped: u64,
    pub failed: u64,
    pub input_bytes: u64,
    pub normalized_bytes: u64,
}

impl RunStats {
    pub fn tally(&mut self, outcome: &Outcome) {
        self.entries += 1;
        match outcome {
            Outcome::Written { .. } => self.decompiled += 1,
            Outcome::Skipped { .. } => self.skipped += 1,
            Outcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Persisted geometry and intensity parameters for one streak.
///
/// The head `(x, y)` is the point of maximum rendered intensity; the tail
/// `(x, y + length)` is the point of minimum intensity. Overlay rendering
/// relies on that ordering to pick the direction of its arrowheads.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StreakRecord {
    pub x: u32,
    pub y: u32,
    pub length: f64,
    pub alpha: f64,
    pub line_width: f64,
}

impl StreakRecord {
    pub fn head(&self) -> (f64, f64) {
        (f64::from(self.x), f64::from(self.y))
    }

    pub fn tail(&self) -> (f64, f64) {
        (f64::from(self.x), f64::from(self.y) + self.length)
    }
}

/// Ordered collection of streak records for one generation pass.
/// Append-only while a pass runs; cleared in full before the next pass.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct StreakLedger {
    records: Vec<StreakRecord>,
}

impl StreakLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn push(&mut self, record: StreakRecord) {
        self.records.push(record);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StreakRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a StreakLedger {
    type Item = &'a StreakRecord;
    type IntoIter = std::slice::Iter<'a, StreakRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

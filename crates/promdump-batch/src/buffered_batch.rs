// Buffered series accumulation
//
// Collects the series returned for consecutive windows until the next flush.
// Series are appended as-is: identical label sets from different windows stay
// separate entries.

use promdump_core::SampleSeries;

#[derive(Debug, Default)]
pub(crate) struct SeriesBuffer {
    series: Vec<SampleSeries>,
    total_points: usize,
    windows: usize,
}

impl SeriesBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the series returned for one window.
    pub fn add_window(&mut self, series: Vec<SampleSeries>) {
        self.total_points += series.iter().map(|s| s.points.len()).sum::<usize>();
        self.windows += 1;
        self.series.extend(series);
    }

    pub fn series(&self) -> &[SampleSeries] {
        &self.series
    }

    pub fn total_points(&self) -> usize {
        self.total_points
    }

    pub fn windows(&self) -> usize {
        self.windows
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Drop everything buffered so far.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promdump_core::{Labels, SamplePair};

    fn series(points: usize) -> SampleSeries {
        SampleSeries::new(
            Labels::new(),
            (0..points as i64).map(|i| SamplePair::new(i, 1.0)).collect(),
        )
    }

    #[test]
    fn keeps_duplicates_in_arrival_order() {
        let mut buffer = SeriesBuffer::new();
        buffer.add_window(vec![series(2), series(1)]);
        buffer.add_window(vec![series(2)]);

        assert_eq!(buffer.series().len(), 3);
        assert_eq!(buffer.total_points(), 5);
        assert_eq!(buffer.windows(), 2);
        assert_eq!(buffer.series()[1].points.len(), 1);
    }

    #[test]
    fn empty_windows_leave_buffer_empty() {
        let mut buffer = SeriesBuffer::new();
        buffer.add_window(Vec::new());

        assert!(buffer.is_empty());
        assert_eq!(buffer.windows(), 1);

        buffer.add_window(vec![series(1)]);
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.windows(), 0);
        assert_eq!(buffer.total_points(), 0);
    }
}

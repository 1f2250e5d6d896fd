//! The unit of work the dispatcher operates on.

use super::job::DownloadJob;

/// An ordered sequence of jobs built from one submission.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    jobs: Vec<DownloadJob>,
}

impl Batch {
    /// Builds a batch from raw input lines.
    ///
    /// Lines are trimmed and blank lines are skipped. Job ids follow the
    /// order of the remaining lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let jobs = lines
            .into_iter()
            .filter_map(|line| {
                let trimmed = line.as_ref().trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            })
            .enumerate()
            .map(|(id, url)| DownloadJob::new(id, url))
            .collect();

        Self { jobs }
    }

    /// Number of jobs in the batch.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Returns `true` when there is nothing to download.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Get the jobs in submission order.
    pub fn jobs(&self) -> &[DownloadJob] {
        &self.jobs
    }

    pub(crate) fn jobs_mut(&mut self) -> &mut [DownloadJob] {
        &mut self.jobs
    }

    /// Consumes the batch, returning its jobs.
    pub fn into_jobs(self) -> Vec<DownloadJob> {
        self.jobs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_are_dropped() {
        let batch = Batch::from_lines(["", "  ", "https://a.example/1", "\t", "https://a.example/2"]);
        let urls: Vec<_> = batch.jobs().iter().map(|j| j.url()).collect();
        assert_eq!(urls, ["https://a.example/1", "https://a.example/2"]);
    }

    #[test]
    fn test_ids_follow_submission_order() {
        let batch = Batch::from_lines(["u0", "", "u1", "u2"]);
        let ids: Vec<_> = batch.jobs().iter().map(|j| j.id()).collect();
        assert_eq!(ids, [0, 1, 2]);
    }

    #[test]
    fn test_empty_input() {
        let batch = Batch::from_lines(Vec::<String>::new());
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn test_lines_are_trimmed() {
        let batch = Batch::from_lines("  https://a.example/1 \r\n".lines());
        assert_eq!(batch.jobs()[0].url(), "https://a.example/1");
    }
}

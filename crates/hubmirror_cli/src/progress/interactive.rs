use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use console::{Term, style};
use hubmirror::sync::SyncProgress;

/// Running position and per-collection counts of each repository in flight.
#[derive(Default)]
struct RepositoryLine {
    index: usize,
    total: usize,
    counts: Vec<(&'static str, usize)>,
}

impl RepositoryLine {
    fn record(&mut self, collection: &'static str, count: usize) {
        match self.counts.iter_mut().find(|(c, _)| *c == collection) {
            Some((_, total)) => *total += count,
            None => self.counts.push((collection, count)),
        }
    }

    fn summary(&self) -> String {
        if self.counts.is_empty() {
            return "nothing new".to_string();
        }
        self.counts
            .iter()
            .map(|(collection, count)| format!("{count} {collection}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Line-oriented reporter for terminals: one line per finished repository.
pub struct InteractiveReporter {
    term: Term,
    lines: Mutex<HashMap<String, RepositoryLine>>,
}

impl InteractiveReporter {
    pub fn new(term: Term) -> Self {
        Self {
            term,
            lines: Mutex::new(HashMap::new()),
        }
    }

    pub fn handle(&self, event: SyncProgress) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);

        let output = match event {
            SyncProgress::FetchingRepositories { owner } => Some(format!(
                "{} repositories of {}",
                style("Fetching").cyan().bold(),
                style(owner).bold()
            )),
            SyncProgress::RepositoriesStored { count, .. } => Some(format!(
                "{} {count} repositories",
                style("  Stored").green().bold()
            )),
            SyncProgress::SyncingRepository {
                repository,
                index,
                total,
            } => {
                lines.insert(
                    repository,
                    RepositoryLine {
                        index,
                        total,
                        counts: Vec::new(),
                    },
                );
                None
            }
            SyncProgress::Stored {
                repository,
                collection,
                count,
            } => {
                lines
                    .entry(repository)
                    .or_default()
                    .record(collection, count);
                None
            }
            SyncProgress::RepositoryComplete { repository } => {
                let line = lines.remove(&repository).unwrap_or_default();
                Some(format!(
                    "{} {} {} ({})",
                    style(format!("[{}/{}]", line.index, line.total)).dim(),
                    style("✓").green(),
                    repository,
                    line.summary()
                ))
            }
            SyncProgress::RepositoryFailed { repository, error } => {
                let line = lines.remove(&repository).unwrap_or_default();
                Some(format!(
                    "{} {} {}: {}",
                    style(format!("[{}/{}]", line.index, line.total)).dim(),
                    style("✗").red(),
                    repository,
                    style(error).red()
                ))
            }
            SyncProgress::Warning { message } => {
                Some(format!("{} {message}", style("warning:").yellow()))
            }
            SyncProgress::SyncComplete {
                succeeded, failed, ..
            } => Some(if failed == 0 {
                format!("{} {succeeded} repositories", style("Synced").green().bold())
            } else {
                format!(
                    "{} {succeeded} repositories, {}",
                    style("Synced").yellow().bold(),
                    style(format!("{failed} failed")).red()
                )
            }),
            _ => None,
        };
        drop(lines);

        if let Some(output) = output {
            let _ = self.term.write_line(&output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_collection() {
        let mut line = RepositoryLine::default();
        assert_eq!(line.summary(), "nothing new");

        line.record("commits", 100);
        line.record("issues", 3);
        line.record("commits", 20);
        assert_eq!(line.summary(), "120 commits, 3 issues");
    }

    #[test]
    fn finished_repositories_are_forgotten() {
        let reporter = InteractiveReporter::new(Term::stderr());
        reporter.handle(SyncProgress::SyncingRepository {
            repository: "octocat/hello".to_string(),
            index: 1,
            total: 2,
        });
        reporter.handle(SyncProgress::Stored {
            repository: "octocat/hello".to_string(),
            collection: "commits",
            count: 4,
        });
        assert_eq!(reporter.lines.lock().unwrap().len(), 1);

        reporter.handle(SyncProgress::RepositoryComplete {
            repository: "octocat/hello".to_string(),
        });
        assert!(reporter.lines.lock().unwrap().is_empty());
    }
}

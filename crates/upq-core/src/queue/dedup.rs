//! Dedup admission filter.
//!
//! Two drops of a file with the same name and size are treated as the same
//! upload intent: the second is silently dropped, regardless of the existing
//! job's status (including failed or completed). Re-running a failed upload
//! goes through explicit retry, never through a fresh drop.

use std::collections::HashSet;

use super::types::{FileRef, JobRecord};

/// Dedup identity: (name, size). Not globally unique — two distinct files can
/// collide — but collisions are treated as the same upload intent by design.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub size: u64,
}

/// Computes the identity key for a file.
pub fn identity_key(file: &FileRef) -> IdentityKey {
    IdentityKey {
        name: file.name.clone(),
        size: file.size,
    }
}

/// Filters a batch of candidates against the existing queue. Candidates whose
/// key matches an existing job, or an earlier candidate in the same batch, are
/// dropped. Order of accepted candidates is preserved.
pub fn accept(candidates: Vec<FileRef>, existing: &[JobRecord]) -> Vec<FileRef> {
    let mut seen: HashSet<IdentityKey> =
        existing.iter().map(|j| identity_key(&j.file)).collect();
    candidates
        .into_iter()
        .filter(|c| seen.insert(identity_key(c)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::types::{JobStatus, UploadedFile};

    fn job(id: u64, name: &str, size: usize, status: JobStatus) -> JobRecord {
        let mut j = JobRecord::new(id, FileRef::from_bytes(name, vec![0; size]));
        j.status = status;
        if status == JobStatus::Completed {
            j.result = Some(UploadedFile::placeholder(&j.file));
        }
        j
    }

    #[test]
    fn accepts_distinct_files() {
        let out = accept(
            vec![
                FileRef::from_bytes("a.txt", vec![0; 3]),
                FileRef::from_bytes("b.txt", vec![0; 3]),
            ],
            &[],
        );
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn drops_duplicate_within_batch() {
        let out = accept(
            vec![
                FileRef::from_bytes("a.txt", vec![0; 3]),
                FileRef::from_bytes("a.txt", vec![1; 3]),
            ],
            &[],
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn drops_candidate_matching_existing_regardless_of_status() {
        for status in [
            JobStatus::Queued,
            JobStatus::Uploading,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            let existing = [job(1, "a.txt", 3, status)];
            let out = accept(vec![FileRef::from_bytes("a.txt", vec![0; 3])], &existing);
            assert!(
                out.is_empty(),
                "candidate should be dropped against {:?} job",
                status
            );
        }
    }

    #[test]
    fn same_name_different_size_is_a_different_file() {
        let existing = [job(1, "a.txt", 3, JobStatus::Queued)];
        let out = accept(vec![FileRef::from_bytes("a.txt", vec![0; 4])], &existing);
        assert_eq!(out.len(), 1);
    }
}

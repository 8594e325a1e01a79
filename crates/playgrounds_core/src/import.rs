use std::path::PathBuf;

use tracing::debug;

use crate::connection::{ConnectionSource, ConnectionTarget, Credentials, resolve_connection_string};
use crate::error::{ImportError, ImportResult};
use crate::loader::{DocumentStore, load_documents};
use crate::naming::to_camel_case;
use crate::reference::{ImportStages, SnapshotReference, resolve_reference};
use crate::scaffold::{ProjectConfig, ScaffoldReport, scaffold_project};
use crate::snapshot::{Snapshot, SnapshotSource};

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub reference: String,
    pub deployment: String,
    pub credentials: Credentials,
    pub database_name: String,
    /// Scaffold target; `./<collectionName>` when unset.
    pub project_dir: Option<PathBuf>,
}

/// The external systems an import talks to.
pub struct Collaborators<'a> {
    pub snapshots: &'a dyn SnapshotSource,
    pub connections: &'a dyn ConnectionSource,
    pub documents: &'a dyn DocumentStore,
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub reference: SnapshotReference,
    pub stages: ImportStages,
    pub snapshot: Snapshot,
    pub target: Option<ConnectionTarget>,
    pub inserted: Option<u64>,
    pub project: Option<ScaffoldReport>,
}

pub fn run_import(
    request: &ImportRequest,
    collaborators: &Collaborators<'_>,
) -> ImportResult<ImportOutcome> {
    let reference = resolve_reference(&request.reference);
    let stages = ImportStages::for_reference(&reference);
    debug!(
        kind = reference.kind(),
        snapshot_id = reference.snapshot_id(),
        ?stages,
        "resolved playground reference"
    );
    run_stages(reference, stages, request, collaborators)
}

/// Run `stages` for an already classified reference.
pub fn run_stages(
    reference: SnapshotReference,
    stages: ImportStages,
    request: &ImportRequest,
    collaborators: &Collaborators<'_>,
) -> ImportResult<ImportOutcome> {
    let connection_string = if stages.needs_connection() {
        Some(resolve_connection_string(
            collaborators.connections,
            &request.deployment,
            &request.credentials,
        )?)
    } else {
        None
    };

    let snapshot = collaborators.snapshots.fetch(reference.snapshot_id())?;

    let mut outcome = ImportOutcome {
        reference,
        stages,
        snapshot,
        target: None,
        inserted: None,
        project: None,
    };
    if !stages.load_documents && !stages.scaffold_project {
        return Ok(outcome);
    }

    let collection_name = to_camel_case(&outcome.snapshot.name);
    if collection_name.is_empty() {
        return Err(ImportError::InvalidCollectionName {
            name: outcome.snapshot.name.clone(),
        });
    }
    let target = ConnectionTarget {
        connection_string: connection_string.unwrap_or_default(),
        database_name: request.database_name.clone(),
        collection_name,
    };

    if stages.load_documents {
        let inserted = load_documents(
            collaborators.documents,
            &target,
            &outcome.snapshot.search_config.documents,
        )?;
        outcome.inserted = Some(inserted);
    }

    if stages.scaffold_project {
        let project_dir = request
            .project_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(&target.collection_name));
        let config = ProjectConfig::from_snapshot(&outcome.snapshot, &target);
        outcome.project = Some(scaffold_project(&project_dir, &config)?);
    }

    outcome.target = Some(target);
    Ok(outcome)
}

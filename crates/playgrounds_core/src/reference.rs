use reqwest::Url;

/// How the user pointed at a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotReference {
    RawIdentifier(String),
    SnapshotUrl { id: String, url: String },
}

impl SnapshotReference {
    pub fn snapshot_id(&self) -> &str {
        match self {
            Self::RawIdentifier(id) => id,
            Self::SnapshotUrl { id, .. } => id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::RawIdentifier(_) => "identifier",
            Self::SnapshotUrl { .. } => "url",
        }
    }
}

/// Classify `input` as a snapshot URL or a bare identifier. Never fails.
pub fn resolve_reference(input: &str) -> SnapshotReference {
    // The URL parser strips surrounding whitespace; a padded reference is not a URL.
    if input.trim() != input {
        return SnapshotReference::RawIdentifier(input.to_string());
    }
    let Ok(parsed) = Url::parse(input) else {
        return SnapshotReference::RawIdentifier(input.to_string());
    };
    if parsed.scheme().is_empty() || parsed.host_str().is_none_or(str::is_empty) {
        return SnapshotReference::RawIdentifier(input.to_string());
    }

    let id = parsed
        .path()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string();
    SnapshotReference::SnapshotUrl {
        id,
        url: input.to_string(),
    }
}

/// Side effects selected for an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportStages {
    pub load_documents: bool,
    pub scaffold_project: bool,
}

impl ImportStages {
    pub const FETCH_ONLY: Self = Self {
        load_documents: false,
        scaffold_project: false,
    };

    pub const FULL: Self = Self {
        load_documents: true,
        scaffold_project: true,
    };

    pub fn for_reference(reference: &SnapshotReference) -> Self {
        match reference {
            SnapshotReference::RawIdentifier(_) => Self::FETCH_ONLY,
            SnapshotReference::SnapshotUrl { .. } => Self::FULL,
        }
    }

    pub fn needs_connection(self) -> bool {
        self.load_documents
    }
}

#[derive(Debug)]
pub enum CatalogError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "catalog io error: {}", err),
            CatalogError::Json(err) => write!(f, "catalog json error: {}", err),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Json(err)
    }
}

#[derive(Debug)]
pub enum ReconcileError {
    NotFound(String),
    Scan(std::io::Error),
    Catalog(CatalogError),
}

impl ReconcileError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::NotFound(_))
    }
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::NotFound(name) => write!(f, "not found: {}", name),
            ReconcileError::Scan(err) => write!(f, "scan error: {}", err),
            ReconcileError::Catalog(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ReconcileError {}

impl From<std::io::Error> for ReconcileError {
    fn from(err: std::io::Error) -> Self {
        ReconcileError::Scan(err)
    }
}

impl From<CatalogError> for ReconcileError {
    fn from(err: CatalogError) -> Self {
        ReconcileError::Catalog(err)
    }
}

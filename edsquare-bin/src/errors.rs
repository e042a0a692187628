#[derive(Debug, PartialEq)]
pub enum EdsquareCLIError {
    FailedToReadSquareHeader(String),
    FailedToReadCell(String),
    MissingEndOfDataMarker,
}

impl std::fmt::Display for EdsquareCLIError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdsquareCLIError::FailedToReadSquareHeader(err) => write!(f, "{}", err),
            EdsquareCLIError::FailedToReadCell(err) => write!(f, "{}", err),
            EdsquareCLIError::MissingEndOfDataMarker => write!(f, "repaired data does not end with end-of-data marker"),
        }
    }
}

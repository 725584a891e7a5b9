use std::process::ExitCode;

/// Process exit status, one per startup failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    ConfigLoad,
    InputFolderMissing,
    BrokerSettings,
    BrokerConnection,
    ListInputFolder,
    PrepareFolders,
    Interrupted,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::ConfigLoad => 2,
            Self::InputFolderMissing => 3,
            Self::BrokerSettings => 4,
            Self::BrokerConnection => 5,
            Self::ListInputFolder => 6,
            Self::PrepareFolders => 7,
            Self::Interrupted => 130,
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        ExitCode::from(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_distinct() {
        let all = [
            ExitStatus::Success,
            ExitStatus::ConfigLoad,
            ExitStatus::InputFolderMissing,
            ExitStatus::BrokerSettings,
            ExitStatus::BrokerConnection,
            ExitStatus::ListInputFolder,
            ExitStatus::PrepareFolders,
            ExitStatus::Interrupted,
        ];
        let codes: HashSet<u8> = all.iter().map(|s| s.code()).collect();
        assert_eq!(codes.len(), all.len());
        assert_eq!(ExitStatus::Interrupted.code(), 130);
    }
}

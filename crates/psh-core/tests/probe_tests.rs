mod common;

#[cfg(test)]
mod tests {
    use crate::common::{executor, target, MockConnector};
    use psh_core::error::ExecutionError;
    use psh_core::probe::{classify_directory_probe, command_available, directory_exists};
    use psh_core::transport::Connector;

    #[test]
    fn test_classify_directory_probe() {
        assert!(classify_directory_probe("exists").unwrap());
        assert!(classify_directory_probe("exists\n").unwrap());
        assert!(!classify_directory_probe("not exists").unwrap());

        let err = classify_directory_probe("permission denied").unwrap_err();
        assert!(matches!(err, ExecutionError::ProbeProtocol(_)));
        assert_eq!(err.to_string(), "unexpected output: permission denied");
    }

    #[test]
    fn test_classify_is_not_boolean_coercion() {
        assert!(classify_directory_probe("").is_err());
        assert!(classify_directory_probe("yes").is_err());
        assert!(classify_directory_probe("exists exists").is_err());
    }

    #[test]
    fn test_directory_probe_command_shape() {
        let connector = MockConnector::new(|_, _| Ok("not exists".to_string()));
        let (exec, _) = executor(&connector);
        let mut conn = connector.open(&target(1)).unwrap();

        let exists = directory_exists(&exec, conn.as_mut(), &target(1), "/opt/app").unwrap();
        conn.close();

        assert!(!exists);
        assert_eq!(
            connector.executed(),
            vec!["[ -d '/opt/app' ] && echo 'exists' || echo 'not exists'".to_string()]
        );
    }

    #[test]
    fn test_directory_probe_propagates_execution_error() {
        let connector = MockConnector::new(|_, cmd| {
            Err(ExecutionError::RemoteCommand {
                command: cmd.to_string(),
                reason: "channel closed".to_string(),
            })
        });
        let (exec, _) = executor(&connector);
        let mut conn = connector.open(&target(1)).unwrap();

        let result = directory_exists(&exec, conn.as_mut(), &target(1), "/opt/app");
        conn.close();
        assert!(matches!(result, Err(ExecutionError::RemoteCommand { .. })));
    }

    #[test]
    fn test_command_available() {
        let connector = MockConnector::new(|_, cmd| match cmd {
            "command -v tar" => Ok("/usr/bin/tar\n".to_string()),
            "command -v unzip" => Ok(String::new()),
            _ => Err(ExecutionError::RemoteCommand {
                command: cmd.to_string(),
                reason: "process exited with status 1".to_string(),
            }),
        });
        let (exec, _) = executor(&connector);
        let mut conn = connector.open(&target(1)).unwrap();

        assert!(command_available(&exec, conn.as_mut(), &target(1), "tar"));
        assert!(!command_available(&exec, conn.as_mut(), &target(1), "unzip"));
        assert!(!command_available(&exec, conn.as_mut(), &target(1), "gunzip"));
        conn.close();
    }
}

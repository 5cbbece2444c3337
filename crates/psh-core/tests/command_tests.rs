mod common;

#[cfg(test)]
mod tests {
    use crate::common::{executor, target, MockConnector};
    use psh_core::error::ExecutionError;

    #[test]
    fn test_run_with_header() {
        let connector = MockConnector::new(|_, _| Ok("up 3 days".to_string()));
        let (exec, _) = executor(&connector);

        let output = exec.run(&target(1), "uptime", true).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "----------");
        assert!(lines[1].starts_with("Time: "));
        assert_eq!(lines[2], "ID: i-0001");
        assert_eq!(lines[3], "Name: web-1");
        assert_eq!(lines[4], "IP: 10.0.0.1");
        assert_eq!(lines[5], "Command: uptime");
        assert_eq!(lines[6], "----------");
        assert_eq!(lines[7], "up 3 days");
        assert!(output.ends_with("up 3 days\n"));
    }

    #[test]
    fn test_run_without_header_is_output_only() {
        let connector = MockConnector::new(|_, _| Ok("hello".to_string()));
        let (exec, _) = executor(&connector);

        assert_eq!(exec.run(&target(1), "echo hello", false).unwrap(), "hello\n");
    }

    #[test]
    fn test_connection_closed_on_success_and_failure() {
        let connector = MockConnector::new(|_, cmd| {
            if cmd == "false" {
                Err(ExecutionError::RemoteCommand {
                    command: cmd.to_string(),
                    reason: "process exited with status 1".to_string(),
                })
            } else {
                Ok(String::new())
            }
        });
        let (exec, _) = executor(&connector);

        exec.run(&target(1), "true", true).unwrap();
        let err = exec.run(&target(1), "false", true).unwrap_err();

        assert!(matches!(err, ExecutionError::RemoteCommand { .. }));
        assert_eq!(connector.open_count(), 2);
        assert_eq!(connector.close_count(), 2);
    }

    #[test]
    fn test_connection_error_is_surfaced_and_audited() {
        let connector = MockConnector::ok().refusing("10.0.0.2");
        let (exec, audit) = executor(&connector);

        let err = exec.run(&target(2), "uptime", true).unwrap_err();
        assert!(err.is_connection());
        assert!(connector.executed().is_empty());

        let records = audit.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0], ("10.0.0.2".to_string(), "uptime".to_string(), true));
    }

    #[test]
    fn test_every_execution_is_audited() {
        let connector = MockConnector::ok();
        let (exec, audit) = executor(&connector);

        exec.run(&target(1), "hostname", true).unwrap();
        exec.run(&target(2), "hostname", false).unwrap();

        let records = audit.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|(_, cmd, failed)| cmd == "hostname" && !failed));
    }
}

//! Server launch command resolution

use std::path::{Path, PathBuf};

use agent_core::error::{AgentError, Result};

/// How to start a tool server from its script path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerLaunch {
    pub command: String,
    pub args: Vec<String>,
    pub script: PathBuf,
}

impl ServerLaunch {
    /// `.py` scripts run under `python`, `.js` under `node`. Anything else is
    /// rejected before a process is started.
    pub fn from_script(path: impl AsRef<Path>) -> Result<Self> {
        let script = path.as_ref().to_path_buf();
        let command = match script.extension().and_then(|ext| ext.to_str()) {
            Some("py") => "python",
            Some("js") => "node",
            _ => {
                return Err(AgentError::UnsupportedScript(
                    script.display().to_string(),
                ));
            }
        };

        Ok(Self {
            command: command.into(),
            args: vec![script.display().to_string()],
            script,
        })
    }

    /// Name used in log lines
    pub fn label(&self) -> String {
        self.script
            .file_name()
            .map_or_else(|| self.script.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_script() {
        let launch = ServerLaunch::from_script("servers/customer_server.py").unwrap();
        assert_eq!(launch.command, "python");
        assert_eq!(launch.args, vec!["servers/customer_server.py".to_string()]);
        assert_eq!(launch.label(), "customer_server.py");
    }

    #[test]
    fn test_node_script() {
        let launch = ServerLaunch::from_script("server.js").unwrap();
        assert_eq!(launch.command, "node");
    }

    #[test]
    fn test_rejects_other_extensions() {
        for path in ["server.sh", "server", "server.PY.txt", "server.rb"] {
            let err = ServerLaunch::from_script(path).unwrap_err();
            assert!(matches!(err, AgentError::UnsupportedScript(_)), "{path}");
        }
    }
}

use super::{DiagnosticEngine, EngineError, RawDiagnostic};
use crate::project::Project;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, trace};

/// Engine backed by a long-lived helper process.
///
/// The helper receives one JSON request per line on stdin and answers each
/// with one JSON line on stdout:
///
/// ```text
/// -> {"id":1,"method":"open","params":{"rootDir":..,"configPath":..,"compilerOptions":{..},"fileNames":[..]}}
/// <- {"id":1,"result":null}
/// -> {"id":2,"method":"diagnostics","params":{"file":"/repo/src/a.ts"}}
/// <- {"id":2,"result":[{"code":6385,"start":10,"length":3,"messageText":"'x' is deprecated."}]}
/// -> {"id":3,"method":"definition","params":{"file":"/repo/src/a.ts","offset":10}}
/// <- {"id":3,"result":"/repo/node_modules/lib/index.d.ts"}
/// ```
///
/// A response carrying `"error"` instead of `"result"` marks that request
/// as failed.
pub struct CommandEngine {
    command: String,
    args: Vec<String>,
    process: Option<Process>,
    next_id: u64,
}

struct Process {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

impl CommandEngine {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            process: None,
            next_id: 1,
        }
    }

    fn spawn(&mut self) -> Result<(), EngineError> {
        debug!(command = %self.command, "starting analysis engine");

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Protocol("engine stdout unavailable".to_string()))?;

        self.process = Some(Process {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        });
        Ok(())
    }

    /// Sends one request and waits for the response with the same id.
    /// Transport failures are the outer error; a request the engine
    /// rejected yields `Ok(Err(message))`.
    async fn request(
        &mut self,
        method: &str,
        params: Value,
    ) -> Result<Result<Value, String>, EngineError> {
        let id = self.next_id;
        self.next_id += 1;

        let process = self.process.as_mut().ok_or(EngineError::NotRunning)?;

        let mut line = serde_json::to_string(&Request { id, method, params })
            .map_err(|e| EngineError::Protocol(e.to_string()))?;
        line.push('\n');
        trace!(id, method, "engine request");

        process.stdin.write_all(line.as_bytes()).await?;
        process.stdin.flush().await?;

        loop {
            let Some(reply) = process.stdout.next_line().await? else {
                return Err(EngineError::NotRunning);
            };
            if reply.trim().is_empty() {
                continue;
            }

            let response: Response = serde_json::from_str(&reply)
                .map_err(|e| EngineError::Protocol(format!("{}: {}", e, reply)))?;

            if response.id != id {
                trace!(expected = id, got = response.id, "skipping stale engine response");
                continue;
            }

            return Ok(match response.error {
                Some(message) => Err(message),
                None => Ok(response.result),
            });
        }
    }
}

#[async_trait]
impl DiagnosticEngine for CommandEngine {
    fn name(&self) -> &'static str {
        "External Command"
    }

    async fn open_project(&mut self, project: &Project) -> Result<(), EngineError> {
        if self.process.is_none() {
            self.spawn()?;
        }

        let file_names: Vec<String> = project
            .file_names
            .iter()
            .map(|f| f.to_string_lossy().into_owned())
            .collect();
        let params = json!({
            "rootDir": project.root_dir.to_string_lossy(),
            "configPath": project.config_path.as_ref().map(|p| p.to_string_lossy()),
            "compilerOptions": project.compiler_options,
            "fileNames": file_names,
        });

        self.request("open", params)
            .await?
            .map(|_| ())
            .map_err(|message| EngineError::Analysis {
                path: project.root_dir.clone(),
                message,
            })
    }

    async fn suggestion_diagnostics(
        &mut self,
        file: &Path,
    ) -> Result<Vec<RawDiagnostic>, EngineError> {
        let result = self
            .request("diagnostics", json!({ "file": file.to_string_lossy() }))
            .await?
            .map_err(|message| EngineError::Analysis {
                path: file.to_path_buf(),
                message,
            })?;

        if result.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(result).map_err(|e| EngineError::Protocol(e.to_string()))
    }

    async fn definition_at(
        &mut self,
        file: &Path,
        offset: usize,
    ) -> Result<Option<String>, EngineError> {
        // A failed lookup only costs the origin, not the finding.
        match self
            .request("definition", json!({ "file": file.to_string_lossy(), "offset": offset }))
            .await?
        {
            Ok(Value::String(path)) => Ok(Some(path)),
            Ok(_) | Err(_) => Ok(None),
        }
    }

    fn dispose(&mut self) {
        if let Some(mut process) = self.process.take() {
            debug!(command = %self.command, "stopping analysis engine");
            let _ = process.child.start_kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_engine_not_started() {
        let engine = CommandEngine::new("deprecation-engine", vec![]);
        assert_eq!(engine.name(), "External Command");
        assert!(engine.process.is_none());
    }

    #[tokio::test]
    async fn test_request_before_spawn_fails() {
        let mut engine = CommandEngine::new("deprecation-engine", vec![]);
        let err = engine
            .suggestion_diagnostics(Path::new("/a.ts"))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotRunning));
    }

    #[tokio::test]
    async fn test_missing_command_is_spawn_error() {
        let mut engine = CommandEngine::new("definitely-not-a-real-engine-binary", vec![]);
        let project = Project::empty("/tmp");
        let err = engine.open_project(&project).await.unwrap_err();
        assert!(matches!(err, EngineError::Spawn { .. }));
        engine.dispose();
    }

    #[test]
    fn test_response_parsing() {
        let ok: Response = serde_json::from_str(r#"{"id":3,"result":[1,2]}"#).unwrap();
        assert_eq!(ok.id, 3);
        assert!(ok.error.is_none());

        let failed: Response = serde_json::from_str(r#"{"id":4,"error":"boom"}"#).unwrap();
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.result.is_null());
    }
}

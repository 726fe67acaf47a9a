use anyhow::{Context, Result, bail};
use std::process::Command;

/// The scontrol invocations this tool depends on.
///
/// Hostlist compression and expansion must stay bit-exact with Slurm's own
/// range syntax (e.g. `hpc-10[1-3]`), so both are delegated to scontrol
/// rather than reimplemented. A failed call is a hard error; there is
/// nothing useful to retry locally.
pub trait Scontrol {
    /// `scontrol show hostlist a,b,c` -> compact range string.
    fn compress(&self, names: &[String]) -> Result<String>;
    /// `scontrol show hostnames <range>` -> ordered hostnames.
    fn expand(&self, expr: &str) -> Result<Vec<String>>;
    /// `scontrol update NodeName=<n> NodeAddr=<ip> NodeHostname=<ip>`.
    fn update_node_addr(&self, name: &str, addr: &str) -> Result<()>;
}

pub struct ScontrolCli {
    program: String,
}

impl ScontrolCli {
    pub fn new() -> Self {
        ScontrolCli {
            program: "scontrol".to_string(),
        }
    }

    fn check_output(&self, args: &[String]) -> Result<String> {
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .with_context(|| format!("failed to run {} {}", self.program, args.join(" ")))?;
        if !output.status.success() {
            bail!(
                "{} {} exited with {}: {}",
                self.program,
                args.join(" "),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for ScontrolCli {
    fn default() -> Self {
        Self::new()
    }
}

impl Scontrol for ScontrolCli {
    fn compress(&self, names: &[String]) -> Result<String> {
        let output = self.check_output(&[
            "show".to_string(),
            "hostlist".to_string(),
            names.join(","),
        ])?;
        Ok(output.trim().to_string())
    }

    fn expand(&self, expr: &str) -> Result<Vec<String>> {
        let output = self.check_output(&[
            "show".to_string(),
            "hostnames".to_string(),
            expr.to_string(),
        ])?;
        Ok(split_hostnames(&output))
    }

    fn update_node_addr(&self, name: &str, addr: &str) -> Result<()> {
        self.check_output(&[
            "update".to_string(),
            format!("NodeName={name}"),
            format!("NodeAddr={addr}"),
            format!("NodeHostname={addr}"),
        ])?;
        Ok(())
    }
}

pub fn split_hostnames(output: &str) -> Vec<String> {
    output.split_whitespace().map(str::to_string).collect()
}

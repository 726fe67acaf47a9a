use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the connection settings file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Create the connection settings file for a cluster.
    Initialize(InitializeArgs),
    /// Show the partitions derived from the cluster status.
    Partitions(PartitionsArgs),
    /// Create every node the partitions can hold, in placement-group batches.
    CreateNodes(CreateNodesArgs),
    /// Write the partition and node definitions for slurm.conf.
    SlurmConf(OutputArgs),
    /// Write the switch definitions for topology.conf.
    Topology(OutputArgs),
    /// Start nodes for a Slurm resume call and register their addresses.
    Resume(ResumeArgs),
    /// Re-apply nodearray configuration to partitions whose nodes are idle.
    ApplyChanges(ApplyChangesArgs),
}

#[derive(Args, Debug)]
pub struct InitializeArgs {
    #[arg(long)]
    pub cluster_name: String,

    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub password: String,

    /// Base URL of the cluster manager, e.g. https://cyclecloud.contoso.com.
    #[arg(long)]
    pub url: String,

    /// Overwrite an existing settings file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct PartitionsArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CreateNodesArgs {
    /// Count nodes that already exist toward each batch instead of failing.
    #[arg(long)]
    pub allow_existing: bool,
}

#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Write to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ResumeArgs {
    /// Hostlist expression from Slurm, e.g. hpc-pg0-[1-3].
    pub node_list: String,
}

#[derive(Args, Debug)]
pub struct ApplyChangesArgs {
    /// Nodearrays to apply changes to.
    #[arg(long, value_delimiter = ',', required = true)]
    pub nodearrays: Vec<String>,
}

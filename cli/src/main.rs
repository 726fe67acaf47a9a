// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use cli::args::{Cli, Cmd};
use cli::config::{self, ConnectionSettings};
use cli::filters;
use cli::format::format_partitions_table;
use cli::partition::fetch_partitions;
use cli::provision::{self, ExistingNodePolicy};
use cli::render;
use cli::scontrol::{Scontrol, ScontrolCli};
use cyclecloud::{ClusterApi, CycleCloudClient};

fn init_logging(verbose: bool) {
    let mut builder = env_logger::builder();
    builder.format_timestamp_secs();
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder
            .filter_level(LevelFilter::Off)
            .filter_module("ccslurm", LevelFilter::Info)
            .filter_module("cli", LevelFilter::Info)
            .filter_module("cyclecloud", LevelFilter::Info);
    }
    builder.init();
}

fn connect(config_path: Option<PathBuf>) -> Result<CycleCloudClient> {
    let path = config::resolve_path(config_path)?;
    let settings = config::load(&path)?;
    Ok(CycleCloudClient::new(
        &settings.url,
        &settings.cluster_name,
        &settings.username,
        &settings.password,
    )?)
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(std::io::stdout())),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let scontrol = ScontrolCli::new();

    match cli.cmd {
        Cmd::Initialize(args) => {
            let path = config::resolve_path(cli.config)?;
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let settings = ConnectionSettings {
                cluster_name: args.cluster_name,
                username: args.username,
                password: args.password,
                url: args.url,
            };
            config::initialize(&path, &settings, args.force)?;
            println!("wrote {}", path.display());
        }
        Cmd::Partitions(args) => {
            let api = connect(cli.config)?;
            let partitions = fetch_partitions(&api, &scontrol)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&partitions)?);
            } else {
                print!("{}", format_partitions_table(&partitions));
            }
        }
        Cmd::CreateNodes(args) => {
            let api = connect(cli.config)?;
            let partitions = fetch_partitions(&api, &scontrol)?;
            let policy = match args.allow_existing {
                true => ExistingNodePolicy::AllowExisting,
                false => ExistingNodePolicy::Error,
            };
            provision::create_nodes(&partitions, &api, &scontrol, policy)?;
        }
        Cmd::SlurmConf(args) => {
            let api = connect(cli.config)?;
            let partitions = fetch_partitions(&api, &scontrol)?;
            let mut writer = open_output(args.output.as_deref())?;
            render::generate_slurm_conf(&partitions, writer.as_mut(), &scontrol)?;
        }
        Cmd::Topology(args) => {
            let api = connect(cli.config)?;
            let mut writer = open_output(args.output.as_deref())?;
            render::generate_topology(&api, writer.as_mut(), &scontrol)?;
        }
        Cmd::Resume(args) => {
            let api = connect(cli.config)?;
            let names = scontrol.expand(&args.node_list)?;
            provision::resume(&names, &api, &scontrol)?;
        }
        Cmd::ApplyChanges(args) => {
            let api = connect(cli.config)?;
            let partitions = fetch_partitions(&api, &scontrol)?;
            let nodes = api.get_nodes(None)?;
            let (nodes, partitions) =
                filters::filter_by_nodearrays(nodes, partitions, &args.nodearrays);
            filters::check_apply_changes(&nodes)?;
            provision::create_nodes(&partitions, &api, &scontrol, ExistingNodePolicy::AllowExisting)?;
        }
    }
    Ok(())
}

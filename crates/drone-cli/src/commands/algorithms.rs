//! Routing algorithm management commands.
//!
//! Lists factory and user algorithms, shows a single descriptor, and saves
//! descriptors into the user algorithms directory.

use clap::{Args, Subcommand};
use drone_config::{
    FACTORY_ALGORITHMS, algorithm_name_from_path, ensure_user_algorithms_dir,
    is_factory_algorithm, list_user_algorithms, resolve_algorithm, user_algorithms_dir,
};

use super::common::display_path;

#[derive(Args, Debug)]
pub struct AlgorithmsArgs {
    #[command(subcommand)]
    command: Option<AlgorithmsCommand>,
}

#[derive(Subcommand, Debug)]
enum AlgorithmsCommand {
    /// List available algorithms (factory and user)
    List {
        /// Show only factory algorithms
        #[arg(long)]
        factory: bool,

        /// Show only user algorithms
        #[arg(long)]
        user: bool,

        /// Print each descriptor
        #[arg(long)]
        json: bool,
    },

    /// Show a single algorithm descriptor
    Show {
        /// Factory name, file path, user algorithm name, or inline JSON
        name: String,
    },

    /// Save an algorithm to the user algorithms directory
    Save {
        /// Name for the new algorithm
        name: String,

        /// Algorithm to save: factory name, file path, or inline JSON
        #[arg(short, long)]
        from: String,

        /// Overwrite if the algorithm already exists
        #[arg(long)]
        force: bool,
    },

    /// Show the user algorithms directory
    Paths,
}

pub fn run(args: AlgorithmsArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(AlgorithmsCommand::List {
        factory: false,
        user: false,
        json: false,
    }) {
        AlgorithmsCommand::List {
            factory,
            user,
            json,
        } => list(factory, user, json),
        AlgorithmsCommand::Show { name } => show(&name),
        AlgorithmsCommand::Save { name, from, force } => save(&name, &from, force),
        AlgorithmsCommand::Paths => {
            println!("User algorithms: {}", display_path(&user_algorithms_dir()));
            Ok(())
        }
    }
}

fn list(factory_only: bool, user_only: bool, json: bool) -> anyhow::Result<()> {
    let show_factory = !user_only || factory_only;
    let show_user = !factory_only || user_only;

    if show_factory {
        println!("Factory Algorithms:");
        for factory in FACTORY_ALGORITHMS {
            let algorithm = factory.algorithm();
            let feedback = if algorithm.has_feedback() {
                " [feedback]"
            } else {
                ""
            };
            println!("  {:<16} {}{feedback}", factory.name, factory.description);
            if json {
                println!("  {:<16} {}", "", algorithm.to_json());
            }
        }
    }

    if show_user {
        if show_factory {
            println!();
        }
        println!("User Algorithms:");
        let files = list_user_algorithms();
        if files.is_empty() {
            println!("  (none in {})", display_path(&user_algorithms_dir()));
        }
        for path in files {
            let Some(name) = algorithm_name_from_path(&path) else {
                continue;
            };
            match resolve_algorithm(&path.to_string_lossy()) {
                Ok(algorithm) => {
                    let feedback = if algorithm.has_feedback() {
                        " [feedback]"
                    } else {
                        ""
                    };
                    println!("  {name:<16} {}{feedback}", algorithm.to_json());
                }
                Err(e) => println!("  {name:<16} (invalid: {e})"),
            }
        }
    }
    Ok(())
}

fn show(name: &str) -> anyhow::Result<()> {
    let algorithm = resolve_algorithm(name)?;
    println!("{}", algorithm.to_json());
    println!(
        "Modulation paths: {}, outputs: {}, feedback: {}",
        algorithm.modulations.len(),
        algorithm.outputs.len(),
        if algorithm.has_feedback() { "yes" } else { "no" }
    );
    if !algorithm.is_in_range() {
        println!("Warning: references operators that do not exist; those entries are skipped");
    }
    Ok(())
}

fn save(name: &str, from: &str, force: bool) -> anyhow::Result<()> {
    if is_factory_algorithm(name) {
        anyhow::bail!("'{name}' is a factory algorithm name; choose another name");
    }
    let algorithm = resolve_algorithm(from)?;
    let dir = ensure_user_algorithms_dir()?;
    let path = dir.join(format!("{name}.json"));
    if path.exists() && !force {
        anyhow::bail!(
            "Algorithm '{name}' already exists at {} (use --force to overwrite)",
            display_path(&path)
        );
    }
    std::fs::write(&path, algorithm.to_json())?;
    println!("Saved '{name}' to {}", display_path(&path));
    Ok(())
}

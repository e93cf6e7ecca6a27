// Copyright (C) 2022 Yehowshua Immanuel
// This program is distributed under both the GPLV3 license
// and the YEHOWSHUA license, both of which can be found at
// the root of the folder containing the sources for this program.
use std::time::Instant;

use clap::Parser;
use log::info;

use vcd_header::{parse_vcd_header, ScopeIdx, ScopeTree};

#[derive(Parser)]
struct Cli {
    /// The path to the file to read
    path: std::path::PathBuf,

    /// Only print the metadata, not the scope tree
    #[arg(long)]
    no_scopes: bool,
}

fn indented(indent: usize, name: &str) -> String {
    format!("{}---{name}", "  |".repeat(indent))
}

fn indented_print(indent: usize, name: &str) {
    println!("{}", indented(indent, name));
}

fn print_scope_tree(tree: &ScopeTree, scope_idx: ScopeIdx, indent: usize) {
    let Some(scope) = tree.scope(scope_idx) else {
        return;
    };
    indented_print(indent, scope.identifier());

    let mut vars = scope
        .child_variables()
        .values()
        .filter_map(|var_idx| tree.variable(*var_idx))
        .collect::<Vec<_>>();
    vars.sort_by(|a, b| a.identifier_code().cmp(b.identifier_code()));
    for var in vars {
        let name = match var.reference() {
            Some(reference) if reference.is_single_bit() => {
                format!("{} [{}]", reference.identifier, reference.msb_index)
            }
            Some(reference) => format!(
                "{} [{}:{}]",
                reference.identifier, reference.msb_index, reference.lsb_index
            ),
            None => var.identifier_code().to_string(),
        };
        indented_print(indent + 1, &format!("{:?} {name}", var.var_type()));
    }

    let mut child_scopes = scope.child_scopes().iter().collect::<Vec<_>>();
    child_scopes.sort_by(|(a, _), (b, _)| a.cmp(b));
    for (_, child_idx) in child_scopes {
        print_scope_tree(tree, *child_idx, indent + 1);
    }
}

fn main() -> std::io::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let now = Instant::now();
    let input = std::fs::read(&args.path)?;
    let header = match parse_vcd_header(&input) {
        Ok(header) => header,
        Err(err) => {
            eprintln!("{}: {err}", args.path.display());
            std::process::exit(1);
        }
    };
    let elapsed = now.elapsed();
    info!("parsed header of {} in {:.2?}", args.path.display(), elapsed);

    let metadata = &header.metadata;
    if let Some(version) = &metadata.version {
        println!("version   : {}", version.0);
    }
    match (&metadata.date, metadata.date_time()) {
        (_, Some(date_time)) => println!("date      : {date_time}"),
        (Some(date), None) => println!("date      : {date}"),
        (None, None) => {}
    }
    if let Some(timescale) = metadata.timescale {
        println!("timescale : {timescale}");
    }
    for comment in &metadata.comments {
        println!("comment   : {comment}");
    }

    if !args.no_scopes {
        for root in header.scopes.roots() {
            print_scope_tree(&header.scopes, *root, 0);
        }
    }

    Ok(())
}

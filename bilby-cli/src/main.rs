//! Bilby CLI
//!
//! A stylesheet checker and selector tester for the Bilby styling engine:
//! parse stylesheets and report accumulated errors, dump rule sets with
//! their specificities, or match an ad hoc selector against a JSON-described
//! element tree.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use bilby_css::{Origin, Stylesheet, parse_selector};
use bilby_tree::{ElementData, ElementTree, NodeId, Styleable};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "bilby", about = "Stylesheet checker for the Bilby styling engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse stylesheets and report accumulated lex/parse errors.
    Check {
        /// Stylesheet files to check.
        files: Vec<PathBuf>,
    },
    /// Dump a stylesheet's rule sets, specificities, media groups and
    /// keyframes.
    Rules {
        /// Stylesheet file to dump.
        file: PathBuf,
        /// Emit JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Match a selector against a JSON-described element tree.
    Match {
        /// The selector to test, e.g. "div > p:first-child".
        selector: String,
        /// JSON file describing the element tree.
        #[arg(long)]
        tree: PathBuf,
    },
}

/// JSON shape of one element in a `--tree` file.
#[derive(Deserialize)]
struct JsonNode {
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    classes: Vec<String>,
    #[serde(default)]
    attributes: HashMap<String, String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    children: Vec<JsonNode>,
}

fn main() -> ExitCode {
    match run() {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<bool> {
    let cli = Cli::parse();
    match cli.command {
        Command::Check { files } => check(&files),
        Command::Rules { file, json } => rules(&file, json),
        Command::Match { selector, tree } => match_selector(&selector, &tree),
    }
}

/// Parse each file and print its accumulated errors. Returns false if any
/// file had errors.
fn check(files: &[PathBuf]) -> Result<bool> {
    let mut clean = true;
    for file in files {
        let source = fs::read_to_string(file)
            .with_context(|| format!("reading {}", file.display()))?;
        let mut sheet = Stylesheet::parse(&source, Origin::Application);
        sheet.set_source_path(file.display().to_string());

        if sheet.errors().is_empty() {
            println!(
                "{} {} ({} rule sets, {} media groups, {} keyframes)",
                "ok".green().bold(),
                file.display(),
                sheet.rule_sets().len(),
                sheet.media_groups().len(),
                sheet.keyframe_count(),
            );
        } else {
            clean = false;
            println!(
                "{} {} ({} problems)",
                "errors".red().bold(),
                file.display(),
                sheet.errors().len()
            );
            for error in sheet.errors() {
                println!("  {} {error}", "-".dimmed());
            }
        }
    }
    Ok(clean)
}

/// Dump rule sets with specificity and source order.
fn rules(file: &Path, json: bool) -> Result<bool> {
    let source =
        fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let sheet = Stylesheet::parse(&source, Origin::Application);

    if json {
        let dump: Vec<serde_json::Value> = sheet
            .rule_sets()
            .iter()
            .map(rule_set_json)
            .collect();
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(sheet.errors().is_empty());
    }

    println!("== rule sets ==");
    for rule_set in sheet.rule_sets() {
        print_rule_set(rule_set, "");
    }
    for group in sheet.media_groups() {
        println!("== @media group ({} rule sets) ==", group.rule_sets().len());
        for rule_set in group.rule_sets() {
            print_rule_set(rule_set, "  ");
        }
    }
    if sheet.keyframe_count() > 0 {
        println!("== keyframes: {} ==", sheet.keyframe_count());
    }
    for error in sheet.errors() {
        println!("{} {error}", "!".red().bold());
    }
    Ok(sheet.errors().is_empty())
}

fn print_rule_set(rule_set: &bilby_css::RuleSet, indent: &str) {
    let selectors: Vec<String> = rule_set
        .selectors()
        .iter()
        .map(ToString::to_string)
        .collect();
    println!(
        "{indent}{} {} [{} declarations, #{}]",
        selectors.join(", ").bold(),
        rule_set.specificity(),
        rule_set.declarations().len(),
        rule_set.source_index(),
    );
    for declaration in rule_set.declarations() {
        println!(
            "{indent}  {}: {}{}",
            declaration.name().cyan(),
            declaration.value_text(),
            if declaration.important() {
                " !important"
            } else {
                ""
            }
        );
    }
}

fn rule_set_json(rule_set: &bilby_css::RuleSet) -> serde_json::Value {
    serde_json::json!({
        "selectors": rule_set
            .selectors()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        "specificity": rule_set.specificity(),
        "source_index": rule_set.source_index(),
        "declarations": rule_set
            .declarations()
            .iter()
            .map(|d| serde_json::json!({
                "name": d.name(),
                "value": d.value_text(),
                "important": d.important(),
            }))
            .collect::<Vec<_>>(),
    })
}

/// Parse the selector and the tree, then print every matching node.
fn match_selector(selector_source: &str, tree_file: &Path) -> Result<bool> {
    let selector = parse_selector(selector_source)
        .map_err(|error| anyhow::anyhow!("{error}"))
        .context("parsing selector")?;

    let json = fs::read_to_string(tree_file)
        .with_context(|| format!("reading {}", tree_file.display()))?;
    let root: JsonNode = serde_json::from_str(&json).context("parsing tree JSON")?;

    let mut tree = ElementTree::new(root.type_name.clone());
    apply_node(&mut tree, NodeId::ROOT, &root);
    for child in &root.children {
        build_subtree(&mut tree, NodeId::ROOT, child);
    }

    let mut matches = Vec::new();
    collect_matches(&tree, NodeId::ROOT, &selector, &mut matches);

    if matches.is_empty() {
        println!("{}", "no matches".yellow());
        return Ok(false);
    }
    for id in matches {
        println!("{} {}", "match".green().bold(), describe(&tree, id));
    }
    Ok(true)
}

fn apply_node(tree: &mut ElementTree, id: NodeId, json: &JsonNode) {
    if let Some(style_id) = &json.id {
        tree.set_attribute(id, "id", style_id.clone());
    }
    if !json.classes.is_empty() {
        tree.set_attribute(id, "class", json.classes.join(" "));
    }
    for (name, value) in &json.attributes {
        tree.set_attribute(id, name.clone(), value.clone());
    }
    tree.set_state(id, json.state.clone());
}

fn build_subtree(tree: &mut ElementTree, parent: NodeId, json: &JsonNode) {
    let id = tree.alloc(ElementData::new(json.type_name.clone()));
    tree.append_child(parent, id);
    apply_node(tree, id, json);
    for child in &json.children {
        build_subtree(tree, id, child);
    }
}

fn collect_matches(
    tree: &ElementTree,
    id: NodeId,
    selector: &bilby_css::Selector,
    matches: &mut Vec<NodeId>,
) {
    if selector.matches(&tree.element(id)) {
        matches.push(id);
    }
    for &child in tree.children(id) {
        collect_matches(tree, child, selector, matches);
    }
}

/// A short path like `window > panel > button#save.primary`.
fn describe(tree: &ElementTree, id: NodeId) -> String {
    let mut parts = Vec::new();
    let mut current = Some(id);
    while let Some(node_id) = current {
        let element = tree.element(node_id);
        let mut part = element.type_name().to_string();
        if let Some(style_id) = element.style_id() {
            part.push('#');
            part.push_str(style_id);
        }
        for class in element.style_classes() {
            part.push('.');
            part.push_str(class);
        }
        parts.push(part);
        current = tree.parent(node_id);
    }
    parts.reverse();
    parts.join(" > ")
}

use anyhow::{anyhow, Context, Result};
use arbor_heads::english::{semantic_rules, semantic_selector};
use arbor_heads::{CoordinationFix, HeadSelector, RuleTable};
use arbor_parser::read_trees;
use arbor_protocol::{RuleSet, SentenceId, TreebankPack};
use arbor_solver::english;
use arbor_solver::{
    dependencies_to_string, read_conllx_structures, DependencyGraphBuilder, EnhancementOptions,
    Extras, GrammaticalStructure, RelationRegistry, RelationSetSpec, TypedDependency,
};
use clap::{Parser, Subcommand, ValueEnum};
use rkyv::ser::serializers::AllocSerializer;
use rkyv::ser::Serializer;
use rkyv::AlignedVec;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Arbor: constituency trees to typed dependencies",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a file of trees (or CoNLL-X sentences) into dependencies
    Convert(ConvertArgs),
    /// Compile head rules from JSON into a zero-copy archive
    CompileRules {
        /// JSON rule set; the built-in English semantic rules when omitted
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Print the relation hierarchy
    Relations {
        /// JSON relation set; the built-in English set when omitted
        #[arg(long, value_name = "FILE")]
        relations: Option<PathBuf>,

        /// Dump the set as JSON instead of the indented tree
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct ConvertArgs {
    #[arg(value_name = "FILE")]
    input: PathBuf,

    #[arg(long, value_enum, default_value_t = InputFormat::Trees)]
    input_format: InputFormat,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Typed)]
    format: OutputFormat,

    #[arg(short, long, value_enum, default_value_t = Style::Basic)]
    style: Style,

    /// Ask the collapsed projections for every extra dependency
    #[arg(long)]
    extras: bool,

    /// Separate extra dependencies from tree dependencies with a ====== line
    #[arg(long)]
    extra_sep: bool,

    #[arg(long)]
    keep_punct: bool,

    /// Compiled head rules (see `compile-rules`)
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    /// JSON relation set
    #[arg(long, value_name = "FILE")]
    relations: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Trees,
    Conllx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Typed,
    Conllx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Style {
    Basic,
    NonCollapsed,
    Collapsed,
    CcProcessed,
    CollapsedTree,
    Enhanced,
    EnhancedPlusPlus,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Convert(args) => convert(&args),
        Commands::CompileRules { input, output } => compile_rules(input.as_deref(), &output),
        Commands::Relations { relations, json } => print_relations(relations.as_deref(), json),
    }
}

fn convert(args: &ConvertArgs) -> Result<()> {
    let builder = load_builder(args)?;
    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read input file: {:?}", args.input))?;

    let structures = match args.input_format {
        InputFormat::Trees => {
            let trees = read_trees(&text).context("Failed to read trees")?;
            info!("Read {} trees from {:?}", trees.len(), args.input);
            trees
                .into_iter()
                .enumerate()
                .map(|(i, tree)| builder.build_with_id(SentenceId::new(i as u32), tree))
                .collect::<Result<Vec<_>, _>>()
                .context("Conversion failed")?
        }
        InputFormat::Conllx => {
            read_conllx_structures(&text, builder.registry())
                .context("Failed to read CoNLL-X sentences")?
        }
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for gs in &structures {
        let deps = project(gs, args.style, args.extras);
        out.write_all(render(gs, &deps, args.format, args.extra_sep).as_bytes())?;
        writeln!(out)?;
    }
    info!("Converted {} sentences", structures.len());
    Ok(())
}

fn load_builder(args: &ConvertArgs) -> Result<DependencyGraphBuilder> {
    let selector = match &args.rules {
        Some(path) => {
            let bytes =
                fs::read(path).with_context(|| format!("Failed to read rules: {:?}", path))?;
            let table = load_rule_table(&bytes)?;
            info!("Loaded head rules '{}' ({} categories)", table.name(), table.len());
            HeadSelector::with_hooks(table, TreebankPack::penn(), CoordinationFix)
        }
        None => semantic_selector(),
    };
    let registry = load_registry(args.relations.as_deref())?;
    let builder = DependencyGraphBuilder::new(selector, registry);
    Ok(if args.keep_punct { builder.keep_punctuation() } else { builder })
}

fn load_registry(path: Option<&Path>) -> Result<RelationRegistry> {
    let Some(path) = path else {
        return english::relations().context("Failed to build the English relations");
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read relations: {:?}", path))?;
    let spec: RelationSetSpec =
        serde_json::from_str(&json).context("Failed to parse relation JSON")?;
    debug!("{} relations in {:?}", spec.relations.len(), path);
    RelationRegistry::from_spec(&spec).context("Invalid relation set")
}

/// Validates an archive written by `compile-rules` and builds its table.
fn load_rule_table(bytes: &[u8]) -> Result<RuleTable> {
    // Archives need their own alignment; a plain file buffer may not have it.
    let mut aligned = AlignedVec::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);
    let archived = rkyv::check_archived_root::<RuleSet>(&aligned)
        .map_err(|e| anyhow!("Corrupt rule archive: {}", e))?;
    RuleTable::from_archived(archived).context("Invalid head rules")
}

fn serialize_rules(set: &RuleSet) -> Result<AlignedVec> {
    let mut serializer = AllocSerializer::<256>::default();
    serializer
        .serialize_value(set)
        .map_err(|e| anyhow!("Serialization failed: {:?}", e))?;
    Ok(serializer.into_serializer().into_inner())
}

fn compile_rules(input: Option<&Path>, output: &Path) -> Result<()> {
    let set = match input {
        Some(path) => {
            info!("Reading rules from {:?}", path);
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {:?}", path))?;
            let set: RuleSet = serde_json::from_str(&json).context("Failed to parse rule JSON")?;
            // Reject bad direction tags now rather than at load time.
            RuleTable::from_rule_set(&set).context("Invalid head rules")?;
            set
        }
        None => semantic_rules().to_rule_set(1),
    };

    info!("Compiling {} categories of '{}'", set.rules.len(), set.name);
    let bytes = serialize_rules(&set)?;
    fs::write(output, &bytes)
        .with_context(|| format!("Failed to write output file: {:?}", output))?;
    info!("Wrote {} bytes to {:?}", bytes.len(), output);
    Ok(())
}

fn print_relations(path: Option<&Path>, json: bool) -> Result<()> {
    if json {
        let spec = match path {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read relations: {:?}", path))?;
                serde_json::from_str(&text).context("Failed to parse relation JSON")?
            }
            None => english::relation_set_spec(),
        };
        println!("{}", serde_json::to_string_pretty(&spec)?);
    } else {
        print!("{}", load_registry(path)?.to_pretty_string());
    }
    Ok(())
}

fn project(gs: &GrammaticalStructure, style: Style, extras: bool) -> Vec<TypedDependency> {
    let requested = if extras { Extras::Maximal } else { Extras::None };
    match style {
        Style::Basic => gs.typed_dependencies(Extras::None),
        Style::NonCollapsed => gs.typed_dependencies(Extras::Maximal),
        Style::Collapsed => gs.typed_dependencies_collapsed(requested),
        Style::CcProcessed => gs.typed_dependencies_cc_processed(requested),
        Style::CollapsedTree => gs.typed_dependencies_collapsed_tree(),
        Style::Enhanced => gs.typed_dependencies_enhanced(&EnhancementOptions::enhanced()),
        Style::EnhancedPlusPlus => gs.typed_dependencies_enhanced_plus_plus(),
    }
}

fn render(
    gs: &GrammaticalStructure,
    deps: &[TypedDependency],
    format: OutputFormat,
    extra_sep: bool,
) -> String {
    match format {
        OutputFormat::Typed => dependencies_to_string(deps, extra_sep),
        OutputFormat::Conllx => gs.to_conllx(deps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_parser::read_tree;

    #[test]
    fn test_compiled_rules_load_back() {
        let set = semantic_rules().to_rule_set(1);
        let bytes = serialize_rules(&set).unwrap();
        let table = load_rule_table(&bytes).unwrap();
        assert_eq!(table.to_rule_set(1), set);
    }

    #[test]
    fn test_garbage_archive_is_rejected() {
        assert!(load_rule_table(b"definitely not an archive").is_err());
    }

    #[test]
    fn test_styles_and_formats() {
        let builder = english::structure_builder().unwrap();
        let gs = builder
            .build(read_tree("(ROOT (S (NP (NNP Sam)) (VP (VBD died))))").unwrap())
            .unwrap();

        let basic = project(&gs, Style::Basic, false);
        assert_eq!(
            render(&gs, &basic, OutputFormat::Typed, false),
            "nsubj(died-2, Sam-1)\nroot(ROOT-0, died-2)\n"
        );
        assert_eq!(project(&gs, Style::NonCollapsed, false), basic);

        let conll = render(&gs, &basic, OutputFormat::Conllx, false);
        assert!(conll.starts_with("1\tSam\t_\tNNP\tNNP\t_\t2\tnsubj"));
    }
}

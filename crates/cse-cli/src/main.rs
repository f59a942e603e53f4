use clap::{Args as ClapArgs, Parser, Subcommand};
use cse_core::{EditError, FieldPatch, FieldPath, SaveStore};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "cse-cli",
    about = "Inspect and patch Clausewitz save archives without touching unrelated bytes",
    version
)]
struct Cli {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Print empire, date, version and planets as JSON
    Info(SaveArgs),
    /// List archive entries with their compression method
    Entries(SaveArgs),
    /// Dump the gamestate tree (or a subtree) as JSON
    Dump(DumpArgs),
    /// Print the value at a field path
    Get(GetArgs),
    /// Patch one or more fields and write a new archive
    Set(SetArgs),
    /// Set a planet's size by planet id
    Planet(PlanetArgs),
    /// Find .sav files under a directory and summarize them
    Scan(ScanArgs),
}

#[derive(ClapArgs, Debug)]
struct SaveArgs {
    /// Save archive (.sav)
    path: PathBuf,
}

#[derive(ClapArgs, Debug)]
struct DumpArgs {
    /// Save archive (.sav)
    path: PathBuf,
    /// Field path of the subtree to dump, e.g. planets.planet.0
    #[arg(long)]
    at: Option<String>,
    /// Max children included per block
    #[arg(long, default_value_t = 128)]
    max_children: usize,
    /// Max recursion depth
    #[arg(long, default_value_t = 16)]
    max_depth: usize,
    /// Include byte spans
    #[arg(long, default_value_t = false)]
    spans: bool,
}

#[derive(ClapArgs, Debug)]
struct GetArgs {
    /// Save archive (.sav)
    path: PathBuf,
    /// Field path, e.g. planets.0.planet_size or /planets/0/planet_size
    #[arg(long)]
    field: String,
    /// Print every match when sibling names repeat
    #[arg(long, default_value_t = false)]
    all: bool,
}

#[derive(ClapArgs, Debug)]
struct WriteArgs {
    /// Output path; defaults to overwriting the input
    #[arg(long)]
    out: Option<PathBuf>,
    /// Skip the timestamped backup made before overwriting the input
    #[arg(long, default_value_t = false)]
    no_backup: bool,
}

#[derive(ClapArgs, Debug)]
struct SetArgs {
    /// Save archive (.sav)
    path: PathBuf,
    /// PATH=VALUE, repeatable; all fields are applied or none
    #[arg(long = "field", value_name = "PATH=VALUE", required = true)]
    fields: Vec<String>,
    /// Write values verbatim instead of checking them against the current kind
    #[arg(long, default_value_t = false)]
    raw: bool,
    #[command(flatten)]
    write: WriteArgs,
}

#[derive(ClapArgs, Debug)]
struct PlanetArgs {
    /// Save archive (.sav)
    path: PathBuf,
    /// Planet id (key inside the planets table)
    #[arg(long)]
    id: String,
    /// New planet size
    #[arg(long)]
    size: i64,
    #[command(flatten)]
    write: WriteArgs,
}

#[derive(ClapArgs, Debug)]
struct ScanArgs {
    /// Save games directory
    dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    match cli.cmd {
        Cmd::Info(a) => cmd_info(a),
        Cmd::Entries(a) => cmd_entries(a),
        Cmd::Dump(a) => cmd_dump(a),
        Cmd::Get(a) => cmd_get(a),
        Cmd::Set(a) => cmd_set(a),
        Cmd::Planet(a) => cmd_planet(a),
        Cmd::Scan(a) => cmd_scan(a),
    }
}

fn fail(code: i32, e: impl std::fmt::Display) -> ! {
    eprintln!("error: {}", e);
    std::process::exit(code);
}

fn exit_code(e: &EditError) -> i32 {
    match e {
        EditError::ArchiveFormat { .. }
        | EditError::EntryNotFound { .. }
        | EditError::UnterminatedBlock { .. } => 2,
        EditError::PathNotFound { .. } | EditError::InvalidPath { .. } => 3,
        EditError::NotAScalar { .. } | EditError::TypeCoercion { .. } => 4,
        EditError::NoState => 5,
    }
}

fn load_store(path: &Path) -> SaveStore {
    let bytes = std::fs::read(path).unwrap_or_else(|e| fail(2, format!("{}: {}", path.display(), e)));
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("save.sav");
    let store = SaveStore::new();
    if let Err(e) = store.load(bytes, name) {
        fail(exit_code(&e), e);
    }
    store
}

fn parse_field_path(s: &str) -> FieldPath {
    s.parse().unwrap_or_else(|e: EditError| fail(exit_code(&e), e))
}

fn split_assignment(s: &str) -> Result<FieldPatch, EditError> {
    let (path, value) = s.split_once('=').ok_or_else(|| EditError::InvalidPath {
        input: s.to_string(),
    })?;
    Ok(FieldPatch::new(path.parse::<FieldPath>()?, value))
}

fn cmd_info(args: SaveArgs) {
    let store = load_store(&args.path);
    match store.summary() {
        Some(s) => println!(
            "{}",
            serde_json::to_string_pretty(&cse_core::summary_to_json_value(&s)).unwrap_or_default()
        ),
        None => fail(5, EditError::NoState),
    }
}

fn cmd_entries(args: SaveArgs) {
    let store = load_store(&args.path);
    let Some(save) = store.snapshot() else {
        fail(5, EditError::NoState)
    };
    for e in save.archive().entries() {
        println!(
            "{}\t{:?}\t{}\t{}",
            e.name, e.compression, e.compressed_size, e.size
        );
    }
}

fn cmd_dump(args: DumpArgs) {
    let store = load_store(&args.path);
    let Some(save) = store.snapshot() else {
        fail(5, EditError::NoState)
    };
    let doc = save.document().unwrap_or_else(|e| fail(exit_code(&e), e));
    let node = match &args.at {
        Some(p) => doc
            .resolve(&parse_field_path(p))
            .unwrap_or_else(|e| fail(exit_code(&e), e)),
        None => doc.root(),
    };
    let opts = cse_core::json::JsonOpts {
        max_children: args.max_children,
        max_depth: args.max_depth,
        spans: args.spans,
    };
    println!("{}", cse_core::json::dump_node_json(node, opts));
}

fn cmd_get(args: GetArgs) {
    let path = parse_field_path(&args.field);
    let store = load_store(&args.path);
    if !args.all {
        match store.get_field(&path) {
            Ok(v) => println!("{}", v),
            Err(e) => fail(exit_code(&e), e),
        }
        return;
    }
    let Some(save) = store.snapshot() else {
        fail(5, EditError::NoState)
    };
    let doc = save.document().unwrap_or_else(|e| fail(exit_code(&e), e));
    let matches = cse_core::resolve_all(&doc, &path);
    if matches.is_empty() {
        fail(3, format!("path not found: {}", path));
    }
    for n in matches {
        let s = n.span();
        println!("{}..{}\t{}", s.start, s.end, n.value().unwrap_or("{...}"));
    }
}

fn cmd_set(args: SetArgs) {
    let patches: Vec<FieldPatch> = args
        .fields
        .iter()
        .map(|f| split_assignment(f).unwrap_or_else(|e| fail(exit_code(&e), e)))
        .collect();
    let store = load_store(&args.path);
    let res = if args.raw {
        patches
            .iter()
            .try_for_each(|p| store.apply_raw_field_patch(&p.path, &p.value))
    } else {
        store.apply_field_patches(&patches)
    };
    if let Err(e) = res {
        fail(exit_code(&e), e);
    }
    write_out(&store, &args.path, args.write);
}

fn cmd_planet(args: PlanetArgs) {
    let store = load_store(&args.path);
    if let Err(e) = store.set_planet_size(&args.id, args.size) {
        fail(exit_code(&e), e);
    }
    write_out(&store, &args.path, args.write);
}

fn write_out(store: &SaveStore, input: &Path, args: WriteArgs) {
    let (bytes, _) = store.export().unwrap_or_else(|e| fail(exit_code(&e), e));
    let dest = args.out.unwrap_or_else(|| input.to_path_buf());
    if dest == input && !args.no_backup {
        match cse_core::backup_file(input) {
            Ok(b) => eprintln!("backup: {}", b.display()),
            Err(e) => fail(6, format!("backup failed: {}", e)),
        }
    }
    std::fs::write(&dest, bytes).unwrap_or_else(|e| fail(6, format!("writing {}: {}", dest.display(), e)));
    println!("wrote {}", dest.display());
}

fn cmd_scan(args: ScanArgs) {
    let saves = cse_core::saves::find_saves(&args.dir);
    if saves.is_empty() {
        fail(3, format!("no .sav files under {}", args.dir.display()));
    }
    for p in saves {
        let summary = std::fs::read(&p)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                cse_core::LoadedSave::from_bytes(bytes, p.display().to_string())
                    .map_err(|e| e.to_string())
            });
        match summary {
            Ok(s) => {
                let s = s.summary();
                println!(
                    "{}\t{}\t{}\t{} planets",
                    p.display(),
                    s.empire_name.as_deref().unwrap_or("?"),
                    s.game_date.as_deref().unwrap_or("?"),
                    s.planets.len()
                );
            }
            Err(e) => println!("{}\t$error: {}", p.display(), e),
        }
    }
}

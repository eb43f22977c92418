use std::collections::HashSet;
use std::fs;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use globset::{Glob, GlobSetBuilder};
use handlebars::Handlebars;
use icon_table_core::config::{AlphaOnlyPolicy, ResizeFilter, parse_size};
use icon_table_core::{
    BuildConfig, BuildOutput, HeaderOptions, ImageTable, InputImage, build_table, diff_record,
    parse_cpp_header, parse_json, prepare_pixels, to_cpp_header_with, to_json, verify_table,
};
use image::ImageReader;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(
    name = "icon-table",
    about = "Embed a folder of icons as run-length encoded byte tables in a C++ header",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Show progress bars (disable with --no-progress or --quiet)
    #[arg(long, default_value_t = true, action=ArgAction::Set, global=true, help_heading = "Logging/UX")]
    progress: bool,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging/UX")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging/UX"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encode images and write the table
    Build(BuildArgs),
    /// Decode a generated header (or JSON table) and write every image as PNG
    Verify(VerifyArgs),
    /// List the records of a generated header (or JSON table)
    Inspect(InspectArgs),
}

#[derive(Parser, Debug, Clone)]
struct BuildArgs {
    // Input/Output
    /// Input file or directory
    #[arg(help_heading = "Input/Output")]
    input: PathBuf,
    /// Output file (header, JSON or rendered template)
    #[arg(short, long, default_value = "image_data.h", help_heading = "Input/Output")]
    output: PathBuf,
    /// YAML config file path (overrides encoding options)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,
    /// Include patterns (glob). If set, only files matching any pattern are considered
    #[arg(long, help_heading = "Input/Output")]
    include: Vec<String>,
    /// Exclude patterns (glob). Files matching any pattern will be ignored
    #[arg(long, help_heading = "Input/Output")]
    exclude: Vec<String>,
    /// Descend into subdirectories (names become relative paths)
    #[arg(short, long, default_value_t = false, help_heading = "Input/Output")]
    recursive: bool,

    // Encoding
    /// Resize every image to WxH before encoding (e.g. 64x64)
    #[arg(long, help_heading = "Encoding")]
    resize: Option<String>,
    /// Resize filter: nearest|triangle|catmullrom|gaussian|lanczos3
    #[arg(long, default_value = "lanczos3", help_heading = "Encoding")]
    resize_filter: String,
    /// Alpha-only mapping for every image: none | all
    #[arg(long, default_value = "none", help_heading = "Encoding")]
    alpha_only: String,
    /// Allow alpha-only mapping for this image name (repeatable; overrides --alpha-only)
    #[arg(long = "alpha-only-name", help_heading = "Encoding")]
    alpha_only_names: Vec<String>,
    /// Let the re-encoded PNG compete with the run-length encodings
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Encoding")]
    allow_raw_container: bool,
    /// Store every image as PNG regardless of size
    #[arg(long, default_value_t = false, help_heading = "Encoding")]
    force_raw_container: bool,
    /// Use the original PNG file bytes as PNG candidate when smaller (not resized images only)
    #[arg(long, default_value_t = true, action=ArgAction::Set, help_heading = "Encoding")]
    use_source_bytes: bool,
    /// Encode images in parallel (requires core feature `parallel`)
    #[arg(long, default_value_t = false, help_heading = "Encoding")]
    parallel: bool,
    /// Worker threads for --parallel
    #[arg(long, help_heading = "Encoding")]
    threads: Option<usize>,

    // Export
    /// Output format: header | json | template
    #[arg(long, default_value = "header", help_heading = "Export")]
    metadata: String,
    /// Built-in template: cpp | c
    #[arg(long, help_heading = "Export")]
    engine: Option<String>,
    /// External template file (handlebars), used when --metadata template
    #[arg(long, help_heading = "Export")]
    template: Option<PathBuf>,
    /// Struct name in the generated header
    #[arg(long, default_value = "ImageData", help_heading = "Export")]
    struct_name: String,
    /// Map name in the generated header
    #[arg(long, default_value = "imageMap", help_heading = "Export")]
    map_name: String,
    /// Decode every record and write it as PNG into this directory
    #[arg(long, help_heading = "Export")]
    verify_dir: Option<PathBuf>,
    /// Export build stats (JSON) to this file
    #[arg(long, help_heading = "Export")]
    export_stats: Option<PathBuf>,
    /// Fail if any image could not be encoded
    #[arg(long, default_value_t = false, help_heading = "Export")]
    strict: bool,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: encode and report stats but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct VerifyArgs {
    /// Generated header (.h) or JSON table (.json)
    table: PathBuf,
    /// Directory for decoded PNGs
    #[arg(short, long, default_value = "decompressed")]
    out_dir: PathBuf,
}

#[derive(Parser, Debug, Clone)]
struct InspectArgs {
    /// Generated header (.h) or JSON table (.json)
    table: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Build(args) => run_build(args, cli.progress && !cli.quiet),
        Commands::Verify(args) => run_verify(args),
        Commands::Inspect(args) => run_inspect(args),
    }
}

fn run_build(cli: &BuildArgs, show_progress: bool) -> anyhow::Result<()> {
    let base = build_config_from_args(cli)?;
    let cfg = if let Some(path) = &cli.config {
        let file = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)?;
        y.into_build_config(base)?
    } else {
        base
    };
    cfg.validate()?;

    if cli.print_config {
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&cfg)?),
            _ => println!("{}", serde_json::to_string_pretty(&cfg)?),
        }
        return Ok(());
    }

    let paths = gather_paths(&cli.input, &cli.include, &cli.exclude, cli.recursive)?;
    if paths.is_empty() {
        warn!(input = ?cli.input, "no images found");
    }
    let inputs = load_images_with_progress(&cli.input, &paths, show_progress)?;
    info!(count = inputs.len(), "loaded input images");

    let out = build_table(&inputs, &cfg)?;
    for f in &out.failures {
        error!(name = %f.name, error = %f.error, "image not encoded");
    }
    if cli.strict && !out.failures.is_empty() {
        anyhow::bail!("{} image(s) failed to encode", out.failures.len());
    }

    let stats = out.stats();
    info!(
        images = stats.num_images,
        raw = stats.num_raw_container,
        alpha = stats.num_alpha_rle,
        rgba = stats.num_full_rle,
        stored = stats.stored_bytes,
        saved = format!("{:.3}%", stats.saved_percentage()),
        "stats"
    );

    let header_opts = HeaderOptions {
        struct_name: cli.struct_name.clone(),
        map_name: cli.map_name.clone(),
    };
    let rendered = render_output(cli, &out.table, &header_opts)?;
    if !cli.dry_run {
        write_file(&cli.output, rendered.as_bytes())?;
        info!(output = ?cli.output, images = out.table.len(), "table written");
    }

    if let Some(dir) = &cli.verify_dir {
        if !cli.dry_run {
            write_verification(&out.table, dir)?;
        }
        report_differences(&out, &inputs, &cfg);
    }

    if let Some(stats_path) = &cli.export_stats {
        let value = serde_json::json!({
            "images": stats.num_images,
            "raw_container": stats.num_raw_container,
            "alpha_rle": stats.num_alpha_rle,
            "full_rle": stats.num_full_rle,
            "decoded_bytes": stats.decoded_bytes,
            "stored_bytes": stats.stored_bytes,
            "saved_bytes": stats.saved_bytes(),
            "saved_percentage": stats.saved_percentage(),
            "failed": out.failures.iter().map(|f| f.name.clone()).collect::<Vec<_>>(),
        });
        if !cli.dry_run {
            write_file(stats_path, serde_json::to_string_pretty(&value)?.as_bytes())?;
            info!(?stats_path, "stats exported");
        } else {
            println!("{}", stats.summary());
        }
    }
    Ok(())
}

fn build_config_from_args(cli: &BuildArgs) -> anyhow::Result<BuildConfig> {
    let resize = match &cli.resize {
        Some(s) => Some(parse_size(s).with_context(|| format!("invalid --resize {}", s))?),
        None => None,
    };
    let resize_filter: ResizeFilter = cli
        .resize_filter
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown resize filter: {}", cli.resize_filter))?;
    let alpha_only = if cli.alpha_only_names.is_empty() {
        cli.alpha_only
            .parse::<AlphaOnlyPolicy>()
            .map_err(|_| anyhow::anyhow!("unknown alpha-only mode: {}", cli.alpha_only))?
    } else {
        AlphaOnlyPolicy::Only(cli.alpha_only_names.clone())
    };
    Ok(BuildConfig {
        resize,
        resize_filter,
        alpha_only,
        allow_raw_container: cli.allow_raw_container,
        force_raw_container: cli.force_raw_container,
        use_source_bytes: cli.use_source_bytes,
        parallel: cli.parallel,
        threads: cli.threads,
    })
}

fn render_output(
    cli: &BuildArgs,
    table: &ImageTable,
    header_opts: &HeaderOptions,
) -> anyhow::Result<String> {
    Ok(match cli.metadata.as_str() {
        "header" | "h" => to_cpp_header_with(table, header_opts),
        "json" => serde_json::to_string_pretty(&to_json(table))?,
        "template" => {
            let tpl_owned_from_file: Option<String> = if let Some(path) = &cli.template {
                Some(
                    fs::read_to_string(path)
                        .with_context(|| format!("read template {}", path.display()))?,
                )
            } else {
                None
            };
            let tpl_ref: &str = if let Some(engine) = &cli.engine {
                match engine.to_ascii_lowercase().as_str() {
                    "cpp" => include_str!("templates/cpp_map.hbs"),
                    "c" => include_str!("templates/c_array.hbs"),
                    other => anyhow::bail!("unknown engine template: {}", other),
                }
            } else if let Some(ref s) = tpl_owned_from_file {
                s.as_str()
            } else {
                include_str!("templates/cpp_map.hbs")
            };
            render_template(tpl_ref, &build_template_context(table, header_opts))?
        }
        other => anyhow::bail!("unknown metadata format: {}", other),
    })
}

fn render_template(tpl: &str, ctx: &TemplateContext) -> anyhow::Result<String> {
    let mut reg = Handlebars::new();
    reg.set_strict_mode(true);
    // output is C source, not HTML
    reg.register_escape_fn(handlebars::no_escape);
    reg.register_template_string("tpl", tpl)?;
    Ok(reg.render("tpl", ctx)?)
}

fn write_verification(table: &ImageTable, dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create verify dir {}", dir.display()))?;
    let mut written = HashSet::new();
    for v in verify_table(table)? {
        let path = dir.join(verification_file_name(&v.name)?);
        if !written.insert(path.clone()) {
            anyhow::bail!("{} and another image map to {}", v.name, path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        v.image
            .save(&path)
            .with_context(|| format!("write {}", path.display()))?;
    }
    info!(dir = ?dir, images = table.len(), "verification images written");
    Ok(())
}

fn report_differences(out: &BuildOutput, inputs: &[InputImage], cfg: &BuildConfig) {
    for input in inputs {
        let Some(rec) = out.table.get(&input.name) else {
            continue;
        };
        let (pixels, _) = prepare_pixels(&input.image, cfg);
        match diff_record(rec, &pixels) {
            Ok(report) if report.is_identical() => {
                info!(name = %input.name, kind = %rec.kind(), "decoded identical");
            }
            Ok(report) => {
                warn!(
                    name = %input.name,
                    kind = %rec.kind(),
                    differences = report.num_differences,
                    "decoded output differs from source"
                );
                tracing::debug!("{}: {}", input.name, report);
            }
            Err(e) => error!(name = %input.name, error = %e, "decode failed"),
        }
    }
}

/// Relative output path for a decoded record. Names come from headers that
/// may have been edited by hand, so they must stay below the output directory.
fn verification_file_name(name: &str) -> anyhow::Result<PathBuf> {
    let rel = Path::new(name);
    if name.is_empty() || !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        anyhow::bail!("refusing to write image named {:?} outside the output directory", name);
    }
    let is_png = rel
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    Ok(if is_png {
        rel.to_path_buf()
    } else {
        PathBuf::from(format!("{}.png", name))
    })
}

fn run_verify(args: &VerifyArgs) -> anyhow::Result<()> {
    let table = read_table(&args.table)?;
    write_verification(&table, &args.out_dir)
}

fn run_inspect(args: &InspectArgs) -> anyhow::Result<()> {
    let table = read_table(&args.table)?;
    for rec in &table {
        println!(
            "{}\t{}x{}\t{}\tsize={}\toriginalSize={}",
            rec.name,
            rec.width,
            rec.height,
            rec.kind(),
            rec.size,
            rec.original_size
        );
    }
    println!("{}", table.stats().summary());
    Ok(())
}

fn read_table(path: &Path) -> anyhow::Result<ImageTable> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let table = if is_json {
        parse_json(&text)
    } else {
        parse_cpp_header(&text)
    }
    .with_context(|| format!("parse {}", path.display()))?;
    info!(path = ?path, images = table.len(), "table loaded");
    Ok(table)
}

fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
    }
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}

fn gather_paths(
    path: &Path,
    include: &[String],
    exclude: &[String],
    recursive: bool,
) -> anyhow::Result<Vec<PathBuf>> {
    // Build glob matchers
    let mut inc_set = None;
    if !include.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in include {
            b.add(Glob::new(pat)?);
        }
        inc_set = Some(b.build()?);
    }
    let mut exc_set = None;
    if !exclude.is_empty() {
        let mut b = GlobSetBuilder::new();
        for pat in exclude {
            b.add(Glob::new(pat)?);
        }
        exc_set = Some(b.build()?);
    }
    let mut list: Vec<PathBuf> = Vec::new();
    if path.is_file() {
        if !should_skip(path, inc_set.as_ref(), exc_set.as_ref()) && is_image(path) {
            list.push(path.to_path_buf());
        }
    } else {
        let walker = WalkDir::new(path).sort_by_file_name();
        let walker = if recursive { walker } else { walker.max_depth(1) };
        for entry in walker.into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && !should_skip(p, inc_set.as_ref(), exc_set.as_ref()) && is_image(p) {
                list.push(p.to_path_buf());
            }
        }
    }
    Ok(list)
}

fn should_skip(
    p: &Path,
    include: Option<&globset::GlobSet>,
    exclude: Option<&globset::GlobSet>,
) -> bool {
    let s = p.to_string_lossy().replace('\\', "/");
    if let Some(ex) = exclude {
        if ex.is_match(&s) {
            return true;
        }
    }
    if let Some(inc) = include {
        if !inc.is_match(&s) {
            return true;
        }
    }
    false
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_ascii_lowercase()),
        Some(ext) if matches!(ext.as_str(), "png" | "jpg" | "jpeg" | "bmp" | "tga" | "gif")
    )
}

/// Table key for `p`: path relative to the input root, `/`-separated.
fn image_name(root: &Path, p: &Path) -> String {
    let rel = if root.is_file() {
        p.file_name().map(Path::new).unwrap_or(p)
    } else {
        p.strip_prefix(root).unwrap_or(p)
    };
    rel.to_string_lossy().replace('\\', "/")
}

fn load_images_with_progress(
    root: &Path,
    paths: &[PathBuf],
    progress: bool,
) -> anyhow::Result<Vec<InputImage>> {
    use indicatif::{ProgressBar, ProgressStyle};
    let bar = if progress {
        let b = ProgressBar::new(paths.len() as u64);
        b.set_style(ProgressStyle::with_template(
            "{spinner:.green} loading {pos}/{len} [{elapsed_precise}] {wide_msg}",
        )?);
        Some(b)
    } else {
        None
    };
    let mut list = Vec::with_capacity(paths.len());
    for p in paths {
        let msg = p.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if let Some(b) = &bar {
            b.set_message(msg.to_string());
        }
        match load_image(p) {
            Ok(input) => {
                let name = image_name(root, p);
                list.push(InputImage {
                    name,
                    image: input.0,
                    source: Some(input.1),
                });
            }
            Err(e) => {
                error!(?p, error = %e, "skip image");
            }
        }
        if let Some(b) = &bar {
            b.inc(1);
        }
    }
    if let Some(b) = &bar {
        b.finish_and_clear();
    }
    Ok(list)
}

fn load_image(p: &Path) -> anyhow::Result<(image::DynamicImage, Vec<u8>)> {
    let bytes = fs::read(p)?;
    let img = ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()?
        .decode()?;
    Ok((img, bytes))
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .try_init();
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateImage {
    name: String,
    /// `name` reduced to a C identifier.
    ident: String,
    width: u32,
    height: u32,
    size: usize,
    original_size: usize,
    is_raw_png: bool,
    alpha_only: bool,
    kind: String,
    /// Comma-separated payload bytes.
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TemplateContext {
    struct_name: String,
    map_name: String,
    images: Vec<TemplateImage>,
    meta: serde_json::Value,
}

fn build_template_context(table: &ImageTable, opts: &HeaderOptions) -> TemplateContext {
    let images = table
        .records()
        .map(|rec| TemplateImage {
            name: rec.name.replace('\\', "\\\\").replace('"', "\\\""),
            ident: c_ident(&rec.name),
            width: rec.width,
            height: rec.height,
            size: rec.size,
            original_size: rec.original_size,
            is_raw_png: rec.is_raw_png,
            alpha_only: rec.alpha_only,
            kind: rec.kind().to_string(),
            data: rec
                .data
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(","),
        })
        .collect();
    let stats = table.stats();
    let meta = serde_json::json!({
        "app": "icon-table",
        "version": env!("CARGO_PKG_VERSION"),
        "images": stats.num_images,
        "storedBytes": stats.stored_bytes,
    });
    TemplateContext {
        struct_name: opts.struct_name.clone(),
        map_name: opts.map_name.clone(),
        images,
        meta,
    }
}

fn c_ident(name: &str) -> String {
    let mut s: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if s.chars().next().is_none_or(|c| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    s
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    resize: Option<String>,
    resize_filter: Option<String>,
    alpha_only: Option<String>,
    alpha_only_names: Option<Vec<String>>,
    allow_raw_container: Option<bool>,
    force_raw_container: Option<bool>,
    use_source_bytes: Option<bool>,
    parallel: Option<bool>,
    threads: Option<usize>,
}

impl YamlConfig {
    fn into_build_config(self, mut cfg: BuildConfig) -> anyhow::Result<BuildConfig> {
        if let Some(v) = self.resize {
            cfg.resize = match v.to_ascii_lowercase().as_str() {
                "none" | "off" => None,
                _ => Some(parse_size(&v).with_context(|| format!("invalid resize: {}", v))?),
            };
        }
        if let Some(v) = self.resize_filter {
            cfg.resize_filter = v.parse().unwrap_or(cfg.resize_filter);
        }
        if let Some(v) = self.alpha_only {
            cfg.alpha_only = v.parse().unwrap_or(cfg.alpha_only);
        }
        if let Some(v) = self.alpha_only_names {
            cfg.alpha_only = AlphaOnlyPolicy::Only(v);
        }
        if let Some(v) = self.allow_raw_container {
            cfg.allow_raw_container = v;
        }
        if let Some(v) = self.force_raw_container {
            cfg.force_raw_container = v;
        }
        if let Some(v) = self.use_source_bytes {
            cfg.use_source_bytes = v;
        }
        if let Some(v) = self.parallel {
            cfg.parallel = v;
        }
        if let Some(v) = self.threads {
            cfg.threads = Some(v);
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icon_table_core::{EncodedImage, Encoding};

    fn sample_table() -> ImageTable {
        let mut t = ImageTable::new();
        t.insert(
            "icons/1up.png",
            EncodedImage {
                width: 2,
                height: 2,
                encoding: Encoding::AlphaRle(vec![4, 255]),
                original_size: 4,
            },
        )
        .unwrap();
        t
    }

    #[test]
    fn yaml_overlays_only_given_fields() {
        let y: YamlConfig =
            serde_yaml::from_str("resize: 64x64\nalpha_only_names: [bug.png]\n").unwrap();
        let cfg = y.into_build_config(BuildConfig::default()).unwrap();
        assert_eq!(cfg.resize, Some((64, 64)));
        assert_eq!(cfg.alpha_only, AlphaOnlyPolicy::Only(vec!["bug.png".into()]));
        assert!(cfg.allow_raw_container);
    }

    #[test]
    fn yaml_rejects_bad_resize() {
        let y: YamlConfig = serde_yaml::from_str("resize: big\n").unwrap();
        assert!(y.into_build_config(BuildConfig::default()).is_err());
    }

    #[test]
    fn c_ident_sanitizes() {
        assert_eq!(c_ident("icons/1up.png"), "icons_1up_png");
        assert_eq!(c_ident("1up.png"), "_1up_png");
    }

    #[test]
    fn builtin_templates_render() {
        let ctx = build_template_context(&sample_table(), &HeaderOptions::default());
        let cpp = render_template(include_str!("templates/cpp_map.hbs"), &ctx).unwrap();
        assert!(cpp.contains(
            "{ \"icons/1up.png\", { new unsigned char[2] { 4,255 }, 2, 2, 2, 4, false, true } },"
        ));
        let c = render_template(include_str!("templates/c_array.hbs"), &ctx).unwrap();
        assert!(c.contains("icons_1up_png_data[2] = { 4,255 };"));
    }

    #[test]
    fn gather_respects_recursion_and_globs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        for p in ["a.png", "b.txt", "skip.png", "sub/c.png"] {
            fs::write(root.join(p), b"x").unwrap();
        }
        let flat = gather_paths(root, &[], &["**/skip.png".into()], false).unwrap();
        let names: Vec<String> = flat.iter().map(|p| image_name(root, p)).collect();
        assert_eq!(names, vec!["a.png"]);

        let deep = gather_paths(root, &[], &[], true).unwrap();
        let names: Vec<String> = deep.iter().map(|p| image_name(root, p)).collect();
        assert_eq!(names, vec!["a.png", "skip.png", "sub/c.png"]);
    }

    #[test]
    fn header_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/image_data.h");
        let t = sample_table();
        write_file(&path, to_cpp_header_with(&t, &HeaderOptions::default()).as_bytes()).unwrap();
        assert_eq!(read_table(&path).unwrap(), t);
    }

    #[test]
    fn verification_names_stay_inside_dir() {
        assert_eq!(
            verification_file_name("icons/1up.png").unwrap(),
            PathBuf::from("icons/1up.png")
        );
        assert_eq!(
            verification_file_name("a.jpg").unwrap(),
            PathBuf::from("a.jpg.png")
        );
        for bad in ["../x.png", "/tmp/x.png", "icons/../../x.png", "./x.png", ""] {
            assert!(verification_file_name(bad).is_err(), "{}", bad);
        }
    }

    #[test]
    fn verify_writes_distinct_files_per_extension() {
        let mut t = ImageTable::new();
        for name in ["a.png", "a.jpg"] {
            t.insert(
                name,
                EncodedImage {
                    width: 2,
                    height: 2,
                    encoding: Encoding::AlphaRle(vec![4, 255]),
                    original_size: 4,
                },
            )
            .unwrap();
        }
        let dir = tempfile::tempdir().unwrap();
        write_verification(&t, dir.path()).unwrap();
        assert!(dir.path().join("a.png").is_file());
        assert!(dir.path().join("a.jpg.png").is_file());
    }

    #[test]
    fn verify_refuses_escaping_names() {
        let text = "{ \"../escape.png\", { new unsigned char[2] { 4,255 }, 2, 2, 2, 4, false, true } },";
        let t = parse_cpp_header(text).unwrap();
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        assert!(write_verification(&t, &out).is_err());
        assert!(!root.path().join("escape.png").exists());
    }
}

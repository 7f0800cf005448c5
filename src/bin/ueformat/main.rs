//! UEFormat CLI - Tool for inspecting .uemodel / .ueanim / .ueworld files.

use std::env;
use std::fs::File;
use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};
use memmap2::Mmap;
use rayon::prelude::*;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use ueformat::decode::decode_container;
use ueformat::format::{Container, ContainerHeader};
use ueformat::prelude::*;

/// Parsed command line.
struct Cli {
    level: &'static str,
    json: bool,
    options: DecodeOptions,
    positional: Vec<String>,
}

impl Cli {
    fn parse(args: &[String]) -> Result<Self> {
        let mut cli = Cli {
            level: "info",
            json: false,
            options: DecodeOptions::default(),
            positional: Vec::new(),
        };

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-v" | "--verbose" => cli.level = "debug",
                "-vv" | "--trace" => cli.level = "trace",
                "-q" | "--quiet" => cli.level = "error",
                "-j" | "--json" => cli.json = true,
                "--unscaled" => cli.options.scale = 1.0,
                "--copy-meshes" => cli.options.instance_meshes = false,
                "--scale" => {
                    let value = iter.next().context("--scale needs a value")?;
                    cli.options.scale =
                        value.parse().with_context(|| format!("invalid scale {value:?}"))?;
                }
                _ => cli.positional.push(arg.clone()),
            }
        }
        Ok(cli)
    }
}

fn init_logging(level: &str) {
    // RUST_LOG wins over the verbosity flags.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let cli = match Cli::parse(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("Error: {e:#}");
            process::exit(2);
        }
    };
    init_logging(if cli.json { "error" } else { cli.level });

    let Some((command, rest)) = cli.positional.split_first() else {
        print_help();
        return;
    };

    let result = match command.as_str() {
        "info" | "i" => cmd_info(rest, &cli.options),
        "tree" | "t" => cmd_tree(rest, &cli.options),
        "dump" | "d" => cmd_dump(rest, &cli.options, cli.json),
        "help" | "h" | "-h" | "--help" => {
            print_help();
            Ok(())
        }
        // A bare file path means `info`.
        path if Path::new(path).exists() => cmd_info(&cli.positional, &cli.options),
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_help();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_help() {
    println!("ueformat - UEFormat container toolkit");
    println!();
    println!("USAGE:");
    println!("    ueformat [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    i, info <files...>     Show header and content summary (files decoded in parallel)");
    println!("    t, tree <file>         Show bone hierarchy, tracks or actor placements");
    println!("    d, dump <file>         Dump the decoded scene (--json for JSON)");
    println!("    h, help                Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -v, --verbose          Show debug output");
    println!("    -vv, --trace           Show trace output (very verbose)");
    println!("    -q, --quiet            Only show errors");
    println!("    -j, --json             JSON output for dump");
    println!("    --scale <f>            Positional scale factor (default 0.01)");
    println!("    --unscaled             Keep exporter units (scale 1.0)");
    println!("    --copy-meshes          Give every world actor its own mesh copy");
    println!();
    println!("EXAMPLES:");
    println!("    ueformat info *.uemodel");
    println!("    ueformat tree Mannequin.uemodel");
    println!("    ueformat dump --json Walk.ueanim > walk.json");
    println!("    RUST_LOG=ueformat=trace ueformat info Map.ueworld");
}

/// Map a file into memory.
fn map_file(path: &str) -> Result<Mmap> {
    let file = File::open(path).with_context(|| format!("cannot open {path}"))?;
    // SAFETY: the map is read-only and lives only for this command.
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("cannot map {path}"))?;
    debug!("Mapped {} ({} bytes)", path, mmap.len());
    Ok(mmap)
}

fn load(path: &str, options: &DecodeOptions) -> Result<(ContainerHeader, SceneModel)> {
    info!("Opening {}", path);
    let mmap = map_file(path)?;
    let container = Container::parse(&mmap).with_context(|| format!("{path}: bad container"))?;
    let scene = decode_container(&container, options).with_context(|| format!("{path}: decode failed"))?;
    Ok((container.header().clone(), scene))
}

fn single_file(args: &[String], usage: &str) -> Result<String> {
    match args {
        [path] => Ok(path.clone()),
        _ => bail!("usage: {usage}"),
    }
}

// ============================================================================
// info
// ============================================================================

fn cmd_info(paths: &[String], options: &DecodeOptions) -> Result<()> {
    if paths.is_empty() {
        bail!("usage: ueformat info <files...>");
    }

    let reports: Vec<Result<String>> = paths
        .par_iter()
        .map(|path| load(path, options).map(|(header, scene)| summary(path, &header, &scene)))
        .collect();

    let mut failed = 0;
    for report in reports {
        match report {
            Ok(text) => println!("{text}"),
            Err(e) => {
                failed += 1;
                eprintln!("Error: {e:#}");
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} files failed", paths.len());
    }
    Ok(())
}

fn summary(path: &str, header: &ContainerHeader, scene: &SceneModel) -> String {
    let mut out = format!(
        "{path}\n  kind: {}\n  name: {}\n  version: {}\n",
        header.kind, header.object_name, header.version
    );
    match &header.compression {
        Some(c) => out.push_str(&format!(
            "  compression: {} ({} -> {} bytes)\n",
            c.algorithm, c.compressed_size, c.uncompressed_size
        )),
        None => out.push_str("  compression: none\n"),
    }

    match scene {
        SceneModel::Model(m) => {
            let b = m.bounds();
            out.push_str(&format!("  vertices: {}\n", m.data.num_vertices()));
            out.push_str(&format!("  faces: {}\n", m.num_faces()));
            out.push_str(&format!("  uv channels: {}\n", m.data.uvs.len()));
            out.push_str(&format!("  materials: {}\n", m.data.materials.len()));
            out.push_str(&format!("  bones: {}\n", m.skeleton.as_ref().map_or(0, |s| s.len())));
            out.push_str(&format!("  vertex groups: {}\n", m.vertex_groups.len()));
            out.push_str(&format!("  morph targets: {}\n", m.morph_shapes().len()));
            out.push_str(&format!("  sockets: {}/{}\n", m.sockets.len(), m.data.sockets.len()));
            if !b.is_empty() {
                out.push_str(&format!("  bounds: {:?} - {:?}\n", b.min, b.max));
            }
        }
        SceneModel::Anim(a) => {
            out.push_str(&format!("  frames: {}\n", a.data.num_frames));
            out.push_str(&format!("  fps: {}\n", a.data.frames_per_second));
            out.push_str(&format!("  duration: {:.3}s\n", a.data.duration_seconds()));
            out.push_str(&format!("  tracks: {}\n", a.data.tracks.len()));
            out.push_str(&format!("  curves: {}\n", a.data.curves.len()));
            let unsorted = a.data.tracks.iter().filter(|t| !t.is_frame_sorted()).count();
            if unsorted > 0 {
                out.push_str(&format!("  unsorted tracks: {unsorted}\n"));
            }
        }
        SceneModel::World(w) => {
            out.push_str(&format!("  meshes: {}\n", w.meshes.len()));
            out.push_str(&format!("  actors: {}\n", w.actors.len()));
        }
    }
    out.trim_end().to_string()
}

// ============================================================================
// tree
// ============================================================================

fn cmd_tree(args: &[String], options: &DecodeOptions) -> Result<()> {
    let path = single_file(args, "ueformat tree <file>")?;
    let (header, scene) = load(&path, options)?;
    println!("{} \"{}\"", header.kind, header.object_name);

    match &scene {
        SceneModel::Model(m) => {
            let Some(skeleton) = &m.skeleton else {
                println!("  (no skeleton)");
                return Ok(());
            };
            let deforming: Vec<bool> = {
                let idle = m.non_deforming_bones();
                (0..skeleton.len()).map(|i| !idle.contains(&i)).collect()
            };
            for root in skeleton.roots() {
                print_bone(m, skeleton, root, &deforming);
            }
        }
        SceneModel::Anim(a) => {
            for t in &a.data.tracks {
                println!(
                    "  {} (pos {}, rot {}, scale {})",
                    t.bone_name,
                    t.position_keys.len(),
                    t.rotation_keys.len(),
                    t.scale_keys.len()
                );
            }
            for c in &a.data.curves {
                println!("  ~{} ({} keys)", c.name, c.keys.len());
            }
        }
        SceneModel::World(w) => {
            for placed in &w.actors {
                let p = placed.actor.position;
                println!(
                    "  {} -> {} [{:08x}] at ({:.3}, {:.3}, {:.3})",
                    placed.actor.name, placed.mesh.name, placed.actor.mesh_hash, p.x, p.y, p.z
                );
            }
        }
    }
    Ok(())
}

fn print_bone(model: &ModelScene, skeleton: &Skeleton, index: usize, deforming: &[bool]) {
    let depth = skeleton.depth(index);
    let indent = "  ".repeat(depth + 1);
    let Some(bone) = skeleton.bone(index) else { return };
    let marker = if deforming[index] { "" } else { " (no weights)" };
    println!("{indent}{}{marker}", bone.name);

    for socket in model.sockets.iter().filter(|s| s.parent_index == index) {
        println!("{indent}  @{}", socket.socket.name);
    }
    for child in skeleton.children(index) {
        print_bone(model, skeleton, child, deforming);
    }
}

// ============================================================================
// dump
// ============================================================================

fn cmd_dump(args: &[String], options: &DecodeOptions, json: bool) -> Result<()> {
    let path = single_file(args, "ueformat dump <file> [--json]")?;
    let (_, scene) = load(&path, options)?;

    if json {
        let text = serde_json::to_string_pretty(&scene).context("JSON serialization failed")?;
        println!("{text}");
    } else {
        println!("{scene:#?}");
    }
    Ok(())
}

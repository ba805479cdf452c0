use anyhow::Context;
use clap::{Parser, Subcommand};
use keystone_common::Entity;
use keystone_ecs::{MeshRenderer, Name, Transform};
use keystone_persist::SceneMetadata;
use keystone_scene::{Scene, TransformCache};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "keystone-cli", about = "CLI tool for keystone scenes")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions
    Info,
    /// Build a two-entity hierarchy, move the parent, then destroy it
    Demo {
        /// Also write the scene to this file before the destroy step
        #[arg(short, long)]
        save: Option<PathBuf>,
    },
    /// Load a scene file and print its hierarchy with world positions
    Inspect {
        file: PathBuf,
    },
    /// Check that a scene file can be loaded
    Validate {
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("keystone-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", keystone_common::crate_info());
            println!("ecs: {}", keystone_ecs::crate_info());
            println!("scene: {}", keystone_scene::crate_info());
            println!("persist: {}", keystone_persist::crate_info());
        }
        Commands::Demo { save } => demo(save)?,
        Commands::Inspect { file } => {
            let mut scene = Scene::new();
            let metadata = keystone_persist::load_scene(&mut scene, &file)
                .with_context(|| format!("loading {}", file.display()))?;
            tracing::info!(file = %file.display(), scene = %metadata.name, "inspecting scene");
            println!(
                "{} by {} (created {}, modified {})",
                metadata.name, metadata.author, metadata.created, metadata.modified
            );
            println!("{} entities", scene.entity_count());

            let mut cache = TransformCache::attach(&mut scene);
            for root in scene.roots() {
                print_tree(&scene, &mut cache, root, 0);
            }
        }
        Commands::Validate { file } => {
            let count = keystone_persist::validate_scene_file(&file)
                .with_context(|| format!("validating {}", file.display()))?;
            tracing::info!(file = %file.display(), entities = count, "scene file is valid");
            println!("{}: OK ({count} entities)", file.display());
        }
    }

    Ok(())
}

fn demo(save: Option<PathBuf>) -> anyhow::Result<()> {
    let mut scene = Scene::new();
    let mut cache = TransformCache::attach(&mut scene);
    tracing::info!("running demo");

    let parent = scene.create_entity("E1");
    scene.add_component(parent, Transform::from_xyz(0.0, 0.0, 0.0));
    let child = scene.create_entity("E2");
    scene.add_component(child, Transform::from_xyz(1.0, 0.0, 0.0));
    anyhow::ensure!(scene.set_parent(child, parent), "E2 could not be parented to E1");
    println!("E2 world after parenting: {}", cache.world_translation(&scene, child));

    if let Some(t) = scene.get_component_mut::<Transform>(parent) {
        t.set_position(glam::Vec3::new(10.0, 0.0, 0.0));
    }
    cache.mark_dirty(&scene, parent);
    println!("E2 world after moving E1: {}", cache.world_translation(&scene, child));

    if let Some(path) = save {
        let metadata =
            keystone_persist::save_scene(&scene, &path, &SceneMetadata::named("Demo"))?;
        println!("saved {} at {}", path.display(), metadata.modified);
    }

    scene.destroy_entity(parent);
    println!(
        "after destroying E1: E1 valid={}, E2 valid={}",
        scene.is_valid(parent),
        scene.is_valid(child)
    );
    let stats = cache.stats();
    println!("cache: {} hits, {} recomputes", stats.hits, stats.recomputes);
    Ok(())
}

fn print_tree(scene: &Scene, cache: &mut TransformCache, entity: Entity, depth: usize) {
    let name = scene
        .get_component::<Name>(entity)
        .map_or("<unnamed>", Name::as_str);
    let mut line = format!("{}{name} {entity}", "  ".repeat(depth));
    if scene.has_component::<Transform>(entity) {
        line.push_str(&format!(" @ {}", cache.world_translation(scene, entity)));
    }
    if let Some(mesh) = scene.get_component::<MeshRenderer>(entity) {
        match &mesh.mesh_path {
            Some(path) => line.push_str(&format!(" mesh={path}")),
            None => line.push_str(&format!(" mesh=#{}", mesh.mesh.0)),
        }
    }
    println!("{line}");

    for &child in scene.children(entity) {
        print_tree(scene, cache, child, depth + 1);
    }
}

use std::{env, path::PathBuf, process};

use anyhow::bail;
use fbxrig::config::{RigSettings, load_rig_settings};
use fbxrig::rig::{
    MAX_INFLUENCES, SkinnedModel, diagnostic_log_path_for_input, write_skeleton_diagnostic_log,
};
use fbxrig::scene::load_skin_document;
use fbxrig::{ResultExt, Severity, init_logging, log_info};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: fbxrig <skin.json> [settings.json]");
        process::exit(2);
    }

    init_logging();

    let input = PathBuf::from(&args[1]);
    let settings = match args.get(2) {
        Some(path) => load_rig_settings(&PathBuf::from(path))?,
        None => RigSettings::default(),
    };

    let document = load_skin_document(&input)?;
    let records = document.cluster_records();
    let mut model =
        SkinnedModel::from_clusters(records.as_deref(), document.vertex_count, &settings.build);

    for (name, transform) in &settings.pose {
        // Unknown joints are logged and skipped.
        let _ = model
            .set_joint_transform_by_name(name, transform)
            .log_error(Some("pose override"));
    }
    let matrix_count = model.skinning_matrices().len();

    let bound = model
        .skin_attributes()
        .iter()
        .filter(|attribute| !attribute.is_unbound())
        .count();
    let capped = model
        .skin_attributes()
        .iter()
        .filter(|attribute| attribute.slot_count() == MAX_INFLUENCES)
        .count();

    println!("Mesh: {}", document.display_name());
    println!(
        "Joints: {} (skinning matrices: {matrix_count})",
        model.joints().len()
    );
    println!(
        "Vertices: {}, bound: {bound}, at {MAX_INFLUENCES} influences: {capped}",
        model.vertex_count()
    );
    for note in model.notes() {
        let tag = match note.severity {
            Severity::Fatal => "FATAL",
            Severity::Warning => "WARN",
            Severity::Info => "INFO",
        };
        println!("[{tag}] {}: {}", note.code, note.message);
    }

    if settings.write_diagnostic {
        let diagnostic_path = settings
            .diagnostic_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| diagnostic_log_path_for_input(&input));
        write_skeleton_diagnostic_log(&mut model, &input, &diagnostic_path)?;
        log_info!("Diagnostic written to {}", diagnostic_path.display());
    }

    if !model.is_renderable() {
        bail!("{}: skeleton is not usable for skinning", input.display());
    }

    Ok(())
}

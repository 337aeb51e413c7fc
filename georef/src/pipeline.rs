use crate::{
    match_correspondences, AnchorSource, Correspondences, GeoRegisterSettings, Result,
};
use georef_core::{ApplySimilarity, CameraPoseEntry, SimilarityTransform};
use georef_io::{
    read_parameters, write_transform, MeshFile, PointCloud, PoseLog, TransformParameters,
};
use log::*;
use std::path::{Path, PathBuf};
use umeyama::EstimationError;

/// The files taking part in a geo-registration.
#[derive(Debug, Clone, Default)]
pub struct RegisterPaths {
    /// The directory holding the GPS tagged source photographs.
    pub images: PathBuf,
    /// The camera pose log, rewritten in place.
    pub pose_log: PathBuf,
    /// A PLY point cloud, rewritten in place.
    pub point_cloud: Option<PathBuf>,
    /// An OBJ mesh, rewritten in place.
    pub mesh: Option<PathBuf>,
    /// Where to store the estimated transform as a parameter file.
    pub transform_output: Option<PathBuf>,
}

/// What a geo-registration run did.
#[derive(Debug, Clone, PartialEq)]
pub enum Registration {
    /// The transform was estimated and every file was rewritten with it.
    Applied(SimilarityTransform),
    /// No transform could be estimated. No file was touched.
    Skipped(EstimationError),
}

/// Geo-registers a reconstruction.
///
/// The GPS anchors of the images are matched against the camera poses by file name, a
/// similarity transform is estimated from the pairs, and the pose log, the point cloud and the
/// mesh are all moved by it. Every destination is read and transformed before the first one is
/// written, so a malformed file leaves all of them untouched.
///
/// Too few or degenerate correspondences are not an error: the run is reported as
/// [`Registration::Skipped`] and nothing is written.
pub fn register(
    paths: &RegisterPaths,
    anchor_source: &impl AnchorSource,
    settings: &GeoRegisterSettings,
) -> Result<Registration> {
    info!("extracting GPS anchors from {}", paths.images.display());
    let anchors = anchor_source.extract_anchors(&paths.images)?;

    info!("reading camera poses from {}", paths.pose_log.display());
    let mut pose_log = PoseLog::open(&paths.pose_log)?;
    let poses: Vec<CameraPoseEntry> = pose_log.entries().cloned().collect();

    let correspondences = match_correspondences(&anchors, &poses);
    let required = settings.minimum_correspondences();
    if correspondences.len() < required {
        let error = EstimationError::TooFewCorrespondences {
            found: correspondences.len(),
            required,
        };
        warn!("{}, skipping geo-registration", error);
        return Ok(Registration::Skipped(error));
    }

    info!("estimating similarity transform");
    let transform = match settings
        .estimator()
        .estimate(&correspondences.source, &correspondences.target)
    {
        Ok(transform) => transform,
        Err(error) => {
            warn!("{}, skipping geo-registration", error);
            return Ok(Registration::Skipped(error));
        }
    };
    let q = transform.quaternion();
    info!(
        "scale {} rotation (w, x, y, z) {:?} translation {:?}",
        transform.scale,
        [q.w, q.i, q.j, q.k],
        transform.translation.as_slice()
    );
    log_residuals(&correspondences, &transform);

    let mut point_cloud = paths
        .point_cloud
        .as_deref()
        .map(PointCloud::open)
        .transpose()?;
    let mut mesh = paths.mesh.as_deref().map(MeshFile::open).transpose()?;

    info!("applying transform");
    pose_log.apply_similarity(&transform);
    if let Some(point_cloud) = &mut point_cloud {
        point_cloud.apply_similarity(&transform);
    }
    if let Some(mesh) = &mut mesh {
        mesh.apply_similarity(&transform);
    }

    if let (Some(point_cloud), Some(path)) = (&mut point_cloud, &paths.point_cloud) {
        info!("writing point cloud {}", path.display());
        point_cloud.save(path)?;
    }
    info!("writing camera poses {}", paths.pose_log.display());
    pose_log.save(&paths.pose_log)?;
    if let (Some(mesh), Some(path)) = (&mesh, &paths.mesh) {
        info!("writing mesh {}", path.display());
        mesh.save(path, settings.vertex_precision)?;
    }
    if let Some(path) = &paths.transform_output {
        info!("writing transform parameters {}", path.display());
        write_transform(path, &transform)?;
    }
    Ok(Registration::Applied(transform))
}

/// Applies a transform parameter file to a mesh and writes the result to `output_obj`.
///
/// The material library and its textures follow the mesh when `output_obj` is in another
/// directory. Returns the parameters that were applied.
pub fn transform_model(
    input_obj: &Path,
    transform_file: &Path,
    output_obj: &Path,
    settings: &GeoRegisterSettings,
) -> Result<TransformParameters> {
    info!("reading transform parameters {}", transform_file.display());
    let parameters = read_parameters(transform_file, settings.quaternion_tolerance)?;
    info!("reading mesh {}", input_obj.display());
    let mut mesh = MeshFile::open(input_obj)?;
    mesh.apply_similarity(&parameters.transform);
    info!("writing mesh {}", output_obj.display());
    mesh.save(output_obj, settings.vertex_precision)?;
    Ok(parameters)
}

fn log_residuals(correspondences: &Correspondences, transform: &SimilarityTransform) {
    let Correspondences {
        names,
        source,
        target,
    } = correspondences;
    let mut sum_squared = 0.0;
    for ((name, a), b) in names.iter().zip(source).zip(target) {
        let residual = (transform.transform_point(a) - b).norm();
        debug!("{}: residual {} m", name, residual);
        sum_squared += residual * residual;
    }
    info!(
        "root mean square residual {} m over {} correspondences",
        (sum_squared / names.len() as f64).sqrt(),
        names.len()
    );
}

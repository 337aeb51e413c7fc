use georef::{
    register, transform_model, ExifAnchorSource, GeoRegisterSettings, RegisterPaths,
    Registration,
};
use log::*;
use std::path::{Path, PathBuf};
use structopt::StructOpt;

#[derive(StructOpt, Clone)]
#[structopt(
    name = "georef",
    about = "Geo-register a reconstruction from the GPS tags of its photographs"
)]
enum Opt {
    /// Estimate the transform from image GPS tags to the camera poses and apply it.
    ///
    /// The pose log, the point cloud and the mesh are rewritten in place. When there are too
    /// few matching images nothing is written.
    Register {
        /// Directory containing the GPS tagged images.
        #[structopt(short, long, parse(from_os_str))]
        images: PathBuf,
        /// The camera pose log (NVM).
        #[structopt(short, long, parse(from_os_str))]
        nvm: PathBuf,
        /// A PLY point cloud to transform.
        #[structopt(short, long, parse(from_os_str))]
        cloud: Option<PathBuf>,
        /// An OBJ mesh to transform.
        #[structopt(short, long, parse(from_os_str))]
        obj: Option<PathBuf>,
        /// File to store the estimated transform in.
        #[structopt(short, long, parse(from_os_str))]
        transform_output: Option<PathBuf>,
        /// The file where settings are specified.
        ///
        /// This is in the format of `georef::GeoRegisterSettings`.
        #[structopt(short, long, default_value = "georef-settings.json")]
        settings: PathBuf,
    },
    /// Apply a transform parameter file (`scale qw qx qy qz tx ty tz`) to an OBJ mesh.
    Transform {
        /// The OBJ mesh to read.
        #[structopt(long, parse(from_os_str))]
        input_obj: PathBuf,
        /// The transform parameter file.
        #[structopt(long, parse(from_os_str))]
        transform_file: PathBuf,
        /// Where to write the transformed mesh.
        #[structopt(long, parse(from_os_str))]
        output_obj: PathBuf,
        /// The file where settings are specified.
        #[structopt(short, long, default_value = "georef-settings.json")]
        settings: PathBuf,
    },
}

fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();

    let outcome = match opt {
        Opt::Register {
            images,
            nvm,
            cloud,
            obj,
            transform_output,
            settings,
        } => {
            let settings = load_settings(&settings);
            let paths = RegisterPaths {
                images,
                pose_log: nvm,
                point_cloud: cloud,
                mesh: obj,
                transform_output,
            };
            let source = ExifAnchorSource::new(settings.clone());
            register(&paths, &source, &settings).map(|registration| match registration {
                Registration::Applied(_) => info!("geo-registration applied"),
                Registration::Skipped(reason) => {
                    info!("geo-registration skipped: {}", reason)
                }
            })
        }
        Opt::Transform {
            input_obj,
            transform_file,
            output_obj,
            settings,
        } => {
            let settings = load_settings(&settings);
            transform_model(&input_obj, &transform_file, &output_obj, &settings).map(|_| ())
        }
    };

    match outcome {
        Ok(()) => info!("done"),
        Err(e) => {
            error!("{}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(cause) = source {
                error!("caused by: {}", cause);
                source = std::error::Error::source(cause);
            }
            std::process::exit(1);
        }
    }
}

fn load_settings(path: &Path) -> GeoRegisterSettings {
    let settings = std::fs::File::open(path)
        .ok()
        .and_then(|file| serde_json::from_reader(file).ok());
    if settings.is_some() {
        info!("loaded existing settings");
    } else {
        info!("used default settings");
    }
    settings.unwrap_or_default()
}

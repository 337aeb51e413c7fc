use approx::assert_relative_eq;
use georef_core::nalgebra::{Point3, Rotation3, Vector3};
use georef_core::{ApplySimilarity, SimilarityTransform};
use georef_io::{
    read_parameters, read_transform, write_transform, Error, MeshFile, PointCloud, PoseLog,
};
use std::fs;

const OBJ: &str = "mtllib surface.mtl
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vt 1 0
vt 0 1
usemtl material_0
f 1/1 2/2 3/3
usemtl unknown
f 3/3 2/2 1/1
";

const MTL: &str = "newmtl material_0
map_Kd textures/material_0.png
newmtl material_1
map_Kd /absolute/elsewhere.png
";

fn sample_transform() -> SimilarityTransform {
    SimilarityTransform::new(
        4.0,
        Rotation3::from_euler_angles(0.5, 0.1, -0.7),
        Vector3::new(500_000.0, 4_000_000.0, 120.0),
    )
}

#[test]
fn mesh_saved_elsewhere_carries_materials_and_textures() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("surface.obj"), OBJ).unwrap();
    fs::write(input.path().join("surface.mtl"), MTL).unwrap();
    fs::create_dir(input.path().join("textures")).unwrap();
    fs::write(input.path().join("textures/material_0.png"), b"\x89PNG").unwrap();

    let mut file = MeshFile::open(&input.path().join("surface.obj")).unwrap();
    assert_eq!(file.materials.as_ref().unwrap().len(), 2);
    file.apply_similarity(&sample_transform());
    file.save(&output.path().join("surface.obj"), Some(6)).unwrap();

    assert_eq!(
        fs::read_to_string(output.path().join("surface.mtl")).unwrap(),
        MTL
    );
    assert_eq!(
        fs::read(output.path().join("textures/material_0.png")).unwrap(),
        b"\x89PNG"
    );

    let reopened = MeshFile::open(&output.path().join("surface.obj")).unwrap();
    assert_eq!(reopened.mesh.faces(), file.mesh.faces());
    for (a, b) in reopened.mesh.vertices().iter().zip(file.mesh.vertices()) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6);
    }
}

#[test]
fn missing_material_library_names_its_path() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("surface.obj"), OBJ).unwrap();
    match MeshFile::open(&dir.path().join("surface.obj")) {
        Err(Error::Io { path, .. }) => assert_eq!(path, dir.path().join("surface.mtl")),
        other => panic!("expected an I/O error, got {:?}", other),
    }
}

#[test]
fn pose_log_is_rewritten_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cameras.nvm");
    let text = "NVM_V3\n\n2\na.jpg 900 1 0 0 0 0 0 0 0 0\nb.jpg 900 1 0 0 0 1 0 0 0 0\n";
    fs::write(&path, text).unwrap();

    let mut log = PoseLog::open(&path).unwrap();
    let transform = sample_transform();
    log.apply_similarity(&transform);
    log.save(&path).unwrap();

    let reread = PoseLog::open(&path).unwrap();
    let positions: Vec<_> = reread.entries().map(|e| e.position).collect();
    assert_relative_eq!(positions[0], Point3::from(transform.translation), epsilon = 1e-6);
    assert_relative_eq!(
        positions[1],
        transform.transform_point(&Point3::new(1.0, 0.0, 0.0)),
        epsilon = 1e-6
    );
}

#[test]
fn transform_file_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transform.txt");
    let transform = sample_transform();
    write_transform(&path, &transform).unwrap();
    let read = read_transform(&path, 1e-5).unwrap();
    assert_eq!(read.scale, transform.scale);
    assert_relative_eq!(read.rotation, transform.rotation, epsilon = 1e-12);

    fs::write(&path, "1 1 0 0 0 0 0\n").unwrap();
    assert!(matches!(
        read_transform(&path, 1e-5),
        Err(Error::Format { .. })
    ));

    fs::write(&path, "0.5 0 0 0 3 1 2 3\n# written by hand\n").unwrap();
    let parameters = read_parameters(&path, 1e-5).unwrap();
    assert!(parameters.renormalized);
    assert_eq!(parameters.transform.scale, 0.5);
    assert_eq!(parameters.transform.translation, Vector3::new(1.0, 2.0, 3.0));
}

#[test]
fn point_cloud_file_is_transformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cloud.ply");
    let points = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 2.0, 3.0),
        Point3::new(-4.0, 5.0, 0.25),
    ];
    PointCloud::from_points(&points).save(&path).unwrap();

    let mut cloud = PointCloud::open(&path).unwrap();
    assert_eq!(cloud.points(), points);
    let transform = sample_transform();
    cloud.apply_similarity(&transform);
    cloud.save(&path).unwrap();

    let moved = PointCloud::open(&path).unwrap().points();
    for (a, b) in moved.iter().zip(transform.apply_to_points(&points)) {
        assert_relative_eq!(*a, b, epsilon = 1e-6);
    }
}

#[test]
fn binary_float_cloud_keeps_utm_precision() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cloud.ply");
    let points = [[0.5f32, -1.25, 3.0], [10.0, 20.0, -7.5]];
    let mut bytes = b"ply
format binary_little_endian 1.0
element vertex 2
property float x
property float y
property float z
property uchar intensity
end_header
"
    .to_vec();
    for (ix, point) in points.iter().enumerate() {
        for value in point {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
        bytes.push(100 + ix as u8);
    }
    fs::write(&path, bytes).unwrap();

    let transform = SimilarityTransform::new(
        37.5,
        Rotation3::from_euler_angles(0.05, -0.02, 1.3),
        Vector3::new(431_250.0, 4_581_900.0, 215.0),
    );
    let mut cloud = PointCloud::open(&path).unwrap();
    let expected = transform.apply_to_points(&cloud.points());
    cloud.apply_similarity(&transform);
    cloud.save(&path).unwrap();

    let written = fs::read(&path).unwrap();
    let header_end = b"end_header\n";
    let split = written
        .windows(header_end.len())
        .position(|w| w == header_end)
        .unwrap();
    let header = std::str::from_utf8(&written[..split]).unwrap();
    assert!(header.contains("format binary_little_endian 1.0"));
    assert!(header.contains("property double x"));
    assert!(header.contains("property uchar intensity"));
    assert_eq!(written.len() - split - header_end.len(), 2 * (3 * 8 + 1));

    let moved = PointCloud::open(&path).unwrap().points();
    for (a, b) in moved.iter().zip(&expected) {
        assert_relative_eq!(*a, *b, epsilon = 1e-6);
    }
}

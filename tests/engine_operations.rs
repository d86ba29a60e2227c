use pretty_assertions::assert_eq;
use float_eq::assert_float_eq;

use units::{cm, degree, kev, per_cm};
use xraysim::{
    ArtifactFilter, FluenceMode, ImageEngine, Material, MaterialTable, Point, Result, Role,
    SceneNode, SimulationContext, TriangleMesh, Vector,
};

/// 25 × 25 pixels of 1 cm, parallel beam along z, photon counting
fn engine() -> ImageEngine {
    let mut materials = MaterialTable::new();
    materials.insert("water", Material::Constant(per_cm(0.2)));
    let mut ctx = SimulationContext::new(Box::new(materials));
    ctx.set_monochromatic(kev(60.0), 1e6);
    ctx.set_source_position([0.0, 0.0, -100.0], "cm").unwrap();
    ctx.set_detector_position([0.0, 0.0, 100.0], "cm").unwrap();
    ctx.set_up_vector([0.0, 1.0, 0.0]);
    ctx.set_pixel_count(25, 25);
    ctx.set_pixel_size(1.0, 1.0, "cm").unwrap();
    let mut engine = ImageEngine::new(ctx);
    engine.use_parallel_beam();
    engine.set_fluence_mode(FluenceMode::PhotonCount);
    engine
}

fn add(engine: &mut ImageEngine, label: &str, mesh: TriangleMesh, role: Role) {
    engine.context_mut().scene.add_node(label, SceneNode::new(mesh).with_material("water"));
    engine.add_surface(label, role);
}

fn with_cube() -> ImageEngine {
    let mut engine = engine();
    add(&mut engine, "cube", TriangleMesh::cube(cm(10.0)), Role::Inner);
    engine
}

/// 20 cm along x, 4 cm across
fn with_bar() -> ImageEngine {
    let mut engine = engine();
    add(&mut engine, "bar", TriangleMesh::cuboid([cm(20.0), cm(4.0), cm(4.0)]), Role::Inner);
    engine
}

const CENTRE: [usize; 2] = [12, 12];
const MISS  : [usize; 2] = [ 0,  0];

fn attenuated(mu_l: f32) -> f32 { 1e6 * (-mu_l).exp() }

#[test]
fn translated_scene_leaves_the_beam() -> Result<()> {
    let mut engine = with_cube();
    engine.context_mut().translate_scene(Vector::new(cm(50.0), cm(0.0), cm(0.0)));
    let image = engine.compute_xray_image()?;
    assert!(image.data.iter().all(|&x| x == 1e6));

    engine.context_mut().reset_scene_transform();
    let image = engine.compute_xray_image()?;
    assert_float_eq!(image[CENTRE], attenuated(2.0), r2nd <= 1e-5);
    Ok(())
}

#[test]
fn rotated_scene_changes_chord_length() -> Result<()> {
    let mut engine = with_bar();
    let across = engine.compute_xray_image()?;
    assert_float_eq!(across[CENTRE], attenuated(0.8), r2nd <= 1e-5);

    engine.context_mut().rotate_scene([0.0, 1.0, 0.0], degree(90.0));
    let along = engine.compute_xray_image()?;
    assert_float_eq!(along[CENTRE], attenuated(4.0), r2nd <= 1e-4);
    // The bar no longer reaches 5 cm along x
    assert_eq!(along[[12, 17]], 1e6);
    assert!(across[[12, 17]] < 1e6);
    Ok(())
}

#[test]
fn detector_response_scales_recorded_energy() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("response.tsv");
    std::fs::write(&path, "# incident recorded\n0 0\n100 50\n")?;

    let mut engine = with_cube();
    engine.set_fluence_mode(FluenceMode::Energy);
    engine.context_mut().load_detector_response(&path, "keV")?;
    let image = engine.compute_xray_image()?;
    // 60 keV photons are recorded as 30 keV
    assert_float_eq!(engine.total_energy_with_detector_response(), 1e6 * 0.03, r2nd <= 1e-12);
    assert_float_eq!(image[MISS], 3e4, r2nd <= 1e-6);
    assert_float_eq!(image[CENTRE], 3e4 * (-2.0_f32).exp(), r2nd <= 1e-5);

    engine.context_mut().clear_detector_response();
    let image = engine.compute_xray_image()?;
    assert_float_eq!(image[MISS], 6e4, r2nd <= 1e-6);
    Ok(())
}

#[test]
fn cpu_filter_agrees_on_closed_meshes() -> Result<()> {
    let mut engine = with_cube();
    engine.disable_artifact_filtering();
    let plain = engine.compute_xray_image()?;
    engine.enable_artifact_filtering_on_cpu();
    assert_eq!(engine.artifact_filter(), ArtifactFilter::Cpu);
    let filtered = engine.compute_xray_image()?;
    assert_eq!(filtered[CENTRE], plain[CENTRE]);
    assert_eq!(filtered[MISS], 1e6);
    assert_float_eq!(filtered[CENTRE], attenuated(2.0), r2nd <= 1e-5);
    Ok(())
}

#[test]
fn enabling_one_filter_disables_the_other() {
    let mut engine = engine();
    engine.enable_artifact_filtering_on_cpu();
    engine.enable_artifact_filtering_on_gpu();
    assert_eq!(engine.artifact_filter(), ArtifactFilter::Gpu);
    engine.disable_artifact_filtering();
    assert_eq!(engine.artifact_filter(), ArtifactFilter::Disabled);
}

#[test]
fn sinogram_with_offset() -> Result<()> {
    let mut engine = with_bar();
    let sinogram = engine.compute_sinogram(Point::zero(), 2, degree(90.0))?;
    assert_eq!(sinogram.shape(), &[25, 2, 25]);
    assert_float_eq!(sinogram.spacing[1], 180.0, r2nd <= 1e-12);
    // Scaling is 1 (25 pixels over 25 cm): at 90° and 270° the central ray
    // runs along the bar
    assert_float_eq!(sinogram[[12, 0, 12]], 4.0, abs <= 1e-3);
    assert_float_eq!(sinogram[[12, 1, 12]], 4.0, abs <= 1e-3);
    Ok(())
}

#[test]
fn projection_set_with_offset() -> Result<()> {
    let mut engine = with_bar();
    let projections = engine.compute_projection_set(Point::zero(), 4, degree(90.0))?;
    assert_eq!(projections.shape(), &[4, 25, 25]);
    assert_float_eq!([projections.spacing[0], projections.spacing[1], projections.spacing[2]],
                     [90.0, 10.0, 10.0], r2nd <= [1e-12; 3]);
    // 90°, 180°, 270°, 0°
    for (a, mu_l) in [4.0, 0.8, 4.0, 0.8].into_iter().enumerate() {
        assert_float_eq!(projections[[a, 12, 12]], attenuated(mu_l), r2nd <= 1e-4);
    }
    assert!(engine.projection_set().is_some());
    Ok(())
}

#[test]
fn spacing_follows_axis_order_with_rectangular_pixels() -> Result<()> {
    // 1 cm wide, 2 cm high pixels
    let mut engine = with_cube();
    engine.context_mut().set_pixel_count(25, 10);
    engine.context_mut().set_pixel_size(1.0, 2.0, "cm")?;

    let image = engine.compute_xray_image()?;
    assert_eq!(image.shape(), &[10, 25]);
    assert_float_eq!([image.spacing[0], image.spacing[1]], [20.0, 10.0], r2nd <= [1e-12; 2]);

    // [row, angle, column]
    let sinogram = engine.compute_sinogram(Point::zero(), 3, degree(0.0))?;
    assert_eq!(sinogram.shape(), &[10, 3, 25]);
    assert_float_eq!([sinogram.spacing[0], sinogram.spacing[1], sinogram.spacing[2]],
                     [20.0, 120.0, 10.0], r2nd <= [1e-12; 3]);

    // [angle, row, column]
    let projections = engine.compute_projection_set(Point::zero(), 3, degree(0.0))?;
    assert_eq!(projections.shape(), &[3, 10, 25]);
    assert_float_eq!([projections.spacing[0], projections.spacing[1], projections.spacing[2]],
                     [120.0, 20.0, 10.0], r2nd <= [1e-12; 3]);
    Ok(())
}

#[test]
fn sinogram_of_beam_without_energy_is_zero() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("response.tsv");
    // Every photon is recorded with no energy
    std::fs::write(&path, "0 0
100 0
")?;

    let mut engine = with_cube();
    engine.set_fluence_mode(FluenceMode::Energy);
    engine.context_mut().load_detector_response(&path, "keV")?;
    assert_eq!(engine.total_energy_with_detector_response(), 0.0);
    let sinogram = engine.compute_sinogram(Point::zero(), 2, degree(0.0))?;
    assert_eq!(sinogram.shape(), &[25, 2, 25]);
    assert!(sinogram.data.iter().all(|&x| x == 0.0));
    Ok(())
}

#[test]
fn total_energy_on_detector() {
    let mut engine = engine();
    assert_eq!(engine.total_energy_on_detector(), 625.0 * 1e6);
    engine.set_fluence_mode(FluenceMode::Energy);
    assert_float_eq!(engine.total_energy_on_detector(), 625.0 * 1e6 * 0.06, r2nd <= 1e-12);
}

#[test]
fn extra_energy_channel() -> Result<()> {
    let mut engine = with_cube();
    engine.context_mut().add_energy_channel(kev(80.0), 5e5);
    let image = engine.compute_xray_image()?;
    // The material's attenuation does not depend on energy
    assert_float_eq!(image[MISS], 1.5e6, r2nd <= 1e-6);
    assert_float_eq!(image[CENTRE], 1.5e6 * (-2.0_f32).exp(), r2nd <= 1e-5);
    Ok(())
}

#[test]
fn reset_spectrum_makes_engine_not_ready() -> Result<()> {
    let mut engine = with_cube();
    let before = engine.compute_xray_image()?;
    engine.context_mut().reset_spectrum();
    assert!(!engine.is_ready());
    // The previous result is returned unchanged
    assert_eq!(engine.compute_xray_image()?, before);
    engine.context_mut().set_monochromatic(kev(60.0), 1e6);
    assert!(engine.is_ready());
    Ok(())
}

#[test]
fn spectrum_from_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("spectrum.tsv");
    std::fs::write(&path, "# keV photons\n60\t1000000\n")?;

    let mut engine = with_cube();
    engine.context_mut().load_spectrum(&path, "keV", false, 1)?;
    let image = engine.compute_xray_image()?;
    assert_float_eq!(image[CENTRE], attenuated(2.0), r2nd <= 1e-5);

    // Normalised to a total energy of 1 MeV
    engine.context_mut().load_spectrum(&path, "keV", true, 1)?;
    let image = engine.compute_xray_image()?;
    assert_float_eq!(image[MISS], 1.0 / 0.06, r2nd <= 1e-6);

    assert!(engine.context_mut().load_spectrum(&path, "GeV", false, 1).is_err());
    Ok(())
}

#[test]
fn replacing_materials() -> Result<()> {
    let mut engine = with_cube();
    let mut materials = MaterialTable::new();
    materials.insert("water", Material::Constant(per_cm(0.4)));
    engine.context_mut().set_materials(Box::new(materials));
    let image = engine.compute_xray_image()?;
    assert_float_eq!(image[CENTRE], attenuated(4.0), r2nd <= 1e-5);
    Ok(())
}

#[test]
fn outer_surface_added_through_engine() -> Result<()> {
    let mut engine = with_cube();
    add(&mut engine, "cavity", TriangleMesh::cube(cm(2.0)), Role::Outer);
    assert_eq!(engine.context().scene.outer_surfaces().count(), 1);
    let image = engine.compute_xray_image()?;
    assert_float_eq!(image[CENTRE], attenuated(1.6), r2nd <= 1e-5);
    // The cumulated L-buffer only counts inner surfaces
    let cumulated = engine.compute_cumulated_lbuffer()?;
    assert_float_eq!(cumulated[CENTRE], 10.0, abs <= 1e-4);
    Ok(())
}

#[test]
fn source_samples_average_fluence_not_path_length() -> Result<()> {
    let mut materials = MaterialTable::new();
    materials.insert("absorber", Material::Constant(per_cm(1.0)));
    let mut ctx = SimulationContext::new(Box::new(materials));
    ctx.set_monochromatic(kev(60.0), 1e6);
    ctx.set_source_position([0.0, 0.0, -100.0], "cm")?;
    ctx.set_detector_position([0.0, 0.0, 100.0], "cm")?;
    ctx.set_up_vector([0.0, 1.0, 0.0]);
    ctx.set_pixel_count(1, 1);
    ctx.set_pixel_size(1.0, 1.0, "cm")?;
    ctx.add_source_sample([ 5.0, 0.0, 0.0], "cm")?;
    ctx.add_source_sample([-5.0, 0.0, 0.0], "cm")?;
    // Only the ray from the +x sample crosses this cube
    let mut node = SceneNode::new(TriangleMesh::cube(cm(2.0))).with_material("absorber");
    node.translate(Vector::new(cm(4.75), cm(0.0), cm(-90.0)));
    ctx.scene.add_node("cube", node);
    ctx.scene.add_inner_surface("cube");

    let mut engine = ImageEngine::new(ctx);
    engine.use_point_source();
    engine.set_fluence_mode(FluenceMode::PhotonCount);
    engine.disable_artifact_filtering();

    let chord = 2.0 * (1.0 + (5.0_f64 / 200.0).powi(2)).sqrt();
    let expected = (1e6 + 1e6 * (-chord).exp()) / 2.0;
    let image = engine.compute_xray_image()?;
    assert_float_eq!(image[[0, 0]] as f64, expected, r2nd <= 1e-4);

    // The L-buffer is the mean path length over the samples
    let lb = engine.compute_lbuffer("cube")?;
    assert_float_eq!(lb[[0, 0]] as f64, chord / 2.0, abs <= 1e-4);
    Ok(())
}

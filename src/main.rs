use atrium::media::SyntheticCamera;

fn main() -> anyhow::Result<()> {
    let mut app = atrium::default();
    // Stand-in capture source; swap for a device-backed CameraAccess to
    // show a real feed.
    app.set_camera_source(Box::new(SyntheticCamera::new(640, 360)));
    app.run();
    Ok(())
}

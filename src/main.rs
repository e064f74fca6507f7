use futures::executor::block_on;
use log::{error, info, warn};
use wgpu::{
    Instance, PresentMode, SurfaceConfiguration, SurfaceError, TextureUsages,
    TextureViewDescriptor,
};
use winit::{
    dpi::PhysicalPosition,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::WindowBuilder,
};

use blobmesh::{
    camera::Camera,
    clock::FrameClock,
    config::BlobConfig,
    gpu_context::GpuContext,
    meshing::{FrameOrchestrator, GpuMesher, Grid, Mesher},
    simulation::BlobSimulation,
    visualisation::Visualisation,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(error) = block_on(async_main()) {
        error!("{error}");
        std::process::exit(1);
    }
}

async fn async_main() -> blobmesh::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("loading configuration from {path}");
            BlobConfig::load(path)?
        }
        None => BlobConfig::default(),
    }
    .clamped();

    let event_loop = EventLoop::new();
    let window = WindowBuilder::new()
        .with_title("blobmesh")
        .build(&event_loop)?;

    let instance = Instance::default();
    let surface = unsafe { instance.create_surface(&window) }?;
    let context = GpuContext::new(&instance, Some(&surface)).await?;
    let surface_capabilities = surface.get_capabilities(&context.adapter);
    let surface_format = surface_capabilities.formats[0];

    let size = window.inner_size();
    let mut surface_configuration = SurfaceConfiguration {
        usage: TextureUsages::RENDER_ATTACHMENT,
        format: surface_format,
        width: size.width.max(1),
        height: size.height.max(1),
        present_mode: PresentMode::AutoVsync,
        alpha_mode: surface_capabilities.alpha_modes[0],
        view_formats: vec![],
    };
    surface.configure(&context.device, &surface_configuration);

    let grid = Grid::centered(config.cells_per_axis, config.volume_radius)?;
    let mut simulation = BlobSimulation::new(&config, &grid);
    let mut orchestrator = FrameOrchestrator::new(GpuMesher::new(&context, grid)?);
    let mut visualisation = Visualisation::new(
        &context.device,
        surface_format,
        surface_configuration.width,
        surface_configuration.height,
    );

    let mut camera = Camera::framing(grid.bounds());
    camera.aspect = surface_configuration.width as f32 / surface_configuration.height as f32;
    let mut clock = FrameClock::new(config.tick_interval());
    let field_params = config.field_params();

    let mut dragging = false;
    let mut last_cursor: Option<PhysicalPosition<f64>> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::WaitUntil(clock.next_tick());
        match event {
            Event::WindowEvent {
                event: WindowEvent::MouseInput { state, button: MouseButton::Left, .. },
                ..
            } => {
                dragging = state == ElementState::Pressed;
            }
            Event::WindowEvent {
                event: WindowEvent::CursorMoved { position, .. },
                ..
            } => {
                if let (true, Some(last)) = (dragging, last_cursor) {
                    let window_size = window.inner_size();
                    let delta_x = (position.x - last.x) as f32 / window_size.width.max(1) as f32;
                    let delta_y = (position.y - last.y) as f32 / window_size.height.max(1) as f32;
                    camera.orbit(delta_x * std::f32::consts::TAU, delta_y * std::f32::consts::PI);
                }
                last_cursor = Some(position);
            }
            Event::WindowEvent {
                event: WindowEvent::MouseWheel { delta, .. },
                ..
            } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(delta) => delta.y as f32 / 40.,
                };
                camera.zoom(0.9f32.powf(lines));
            }
            Event::WindowEvent {
                event: WindowEvent::Resized(size),
                ..
            } => {
                surface_configuration.width = size.width.max(1);
                surface_configuration.height = size.height.max(1);
                camera.aspect =
                    surface_configuration.width as f32 / surface_configuration.height as f32;
                surface.configure(&context.device, &surface_configuration);
                visualisation.resize(
                    &context.device,
                    surface_configuration.width,
                    surface_configuration.height,
                );
            }
            Event::MainEventsCleared => {
                if let Some(delta_time) = clock.tick() {
                    simulation.update(delta_time);
                    if let Err(error) = orchestrator.tick(&simulation.primitives(), field_params) {
                        // the next tick meshes a fresh frame
                        warn!("meshing failed: {error}");
                    }
                    window.request_redraw();
                }
            }
            Event::RedrawRequested(_) => {
                let current_texture = match surface.get_current_texture() {
                    Ok(texture) => texture,
                    Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                        surface.configure(&context.device, &surface_configuration);
                        return;
                    }
                    Err(error) => {
                        warn!("failed to acquire a frame: {error}");
                        return;
                    }
                };
                let view = current_texture
                    .texture
                    .create_view(&TextureViewDescriptor::default());
                visualisation.visualise(
                    &context.device,
                    &context.queue,
                    &view,
                    &camera,
                    orchestrator.mesher(),
                    orchestrator.published(),
                );
                current_texture.present();
            }
            Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                window_id,
            } if window_id == window.id() => {
                info!(
                    "closing after {} frames of {} cells",
                    orchestrator.frame(),
                    orchestrator.mesher().grid().cell_count()
                );
                *control_flow = ControlFlow::Exit;
            }
            _ => (),
        }
    });
}

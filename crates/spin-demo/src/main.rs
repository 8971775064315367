use clap::Parser;
use glow::HasContext as _;
use glsl_program::{split_combined_str, GlowBackend, ShaderProgram};
use miette::{miette, IntoDiagnostic, Result};
use spin_demo::{
    compute_mvp, cube_mesh, f32_slice_to_ne_bytes, u16_slice_to_ne_bytes, DemoConfig, Overrides,
    BUILTIN_SHADER, VERTEX_STRIDE,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

const WINDOW_TITLE: &str = "Spin Demo (SDL2 + OpenGL)";

#[derive(Parser, Debug)]
#[command(name = "spin-demo")]
#[command(about = "Draws a rotating cube through a combined GLSL shader file", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

struct GpuMesh {
    vao: glow::NativeVertexArray,
    vbo: glow::NativeBuffer,
    ebo: glow::NativeBuffer,
    index_count: i32,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = match cli.config.as_deref() {
        Some(path) => DemoConfig::load(path)?,
        None => DemoConfig::default(),
    };
    config.apply(&cli.overrides);
    config.validate()?;

    run(&config)
}

fn run(config: &DemoConfig) -> Result<()> {
    let sdl = sdl2::init().map_err(|err| miette!("failed to init SDL2: {err}"))?;
    let video = sdl
        .video()
        .map_err(|err| miette!("failed to init SDL2 video: {err}"))?;

    let (window, _gl_ctx) = create_window_and_context(&video, config)?;
    let _ = video.gl_set_swap_interval(1);

    let gl = unsafe {
        GlowBackend::from_loader_function(|name| video.gl_get_proc_address(name) as *const _)
    };

    let mut shader = ShaderProgram::new(&gl);
    match config.shader.as_deref() {
        Some(path) => {
            log::info!("loading shader {}", path.display());
            shader.compile_combined_file(path);
        }
        None => {
            for (stage, source) in split_combined_str(BUILTIN_SHADER).iter() {
                shader.compile_source(stage, source);
            }
        }
    }
    shader.create_and_link_program();
    if !shader.is_linked() {
        shader.delete_program();
        return Err(miette!("shader program failed to link"));
    }
    shader.register_attribute("a_pos");
    shader.register_attribute("a_color");
    shader.register_uniform("u_mvp");

    let result = match unsafe { upload_cube(gl.context(), &shader) } {
        Ok(mesh) => {
            let result = run_loop(&sdl, &window, &gl, &shader, &mesh, config);
            unsafe {
                let ctx = gl.context();
                ctx.delete_vertex_array(mesh.vao);
                ctx.delete_buffer(mesh.ebo);
                ctx.delete_buffer(mesh.vbo);
            }
            result
        }
        Err(err) => Err(err),
    };
    shader.delete_program();

    result
}

fn create_window_and_context(
    video: &sdl2::VideoSubsystem,
    config: &DemoConfig,
) -> Result<(sdl2::video::Window, sdl2::video::GLContext)> {
    let candidates = [(3, 3), (4, 1)];
    let mut errors = Vec::new();

    for (major, minor) in candidates {
        {
            let gl_attr = video.gl_attr();
            gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
            gl_attr.set_context_version(major, minor);
            gl_attr.set_depth_size(24);
            gl_attr.set_double_buffer(true);
        }

        let window = match video
            .window(WINDOW_TITLE, config.width, config.height)
            .opengl()
            .resizable()
            .build()
        {
            Ok(window) => window,
            Err(err) => {
                errors.push(format!("core {major}.{minor}: window build failed ({err})"));
                continue;
            }
        };

        let gl_ctx = match window.gl_create_context() {
            Ok(ctx) => ctx,
            Err(err) => {
                errors.push(format!("core {major}.{minor}: context create failed ({err})"));
                continue;
            }
        };

        if let Err(err) = window.gl_make_current(&gl_ctx) {
            errors.push(format!("core {major}.{minor}: make current failed ({err})"));
            continue;
        }

        log::info!("created OpenGL {major}.{minor} core context");
        return Ok((window, gl_ctx));
    }

    Err(miette!(
        "failed to create OpenGL context. Attempts: {}",
        errors.join(" | ")
    ))
}

unsafe fn upload_cube(
    gl: &glow::Context,
    shader: &ShaderProgram<'_, GlowBackend>,
) -> Result<GpuMesh> {
    let a_pos = u32::try_from(shader.lookup_attribute("a_pos")?).into_diagnostic()?;
    let a_color = u32::try_from(shader.lookup_attribute("a_color")?).into_diagnostic()?;

    let mesh = cube_mesh();
    let stride = (VERTEX_STRIDE * std::mem::size_of::<f32>()) as i32;

    let vao = gl.create_vertex_array().map_err(|err| miette!(err))?;
    let vbo = gl.create_buffer().map_err(|err| miette!(err))?;
    let ebo = gl.create_buffer().map_err(|err| miette!(err))?;

    gl.bind_vertex_array(Some(vao));
    gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
    gl.buffer_data_u8_slice(
        glow::ARRAY_BUFFER,
        &f32_slice_to_ne_bytes(&mesh.vertices),
        glow::STATIC_DRAW,
    );
    gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ebo));
    gl.buffer_data_u8_slice(
        glow::ELEMENT_ARRAY_BUFFER,
        &u16_slice_to_ne_bytes(&mesh.indices),
        glow::STATIC_DRAW,
    );
    gl.enable_vertex_attrib_array(a_pos);
    gl.vertex_attrib_pointer_f32(a_pos, 3, glow::FLOAT, false, stride, 0);
    gl.enable_vertex_attrib_array(a_color);
    gl.vertex_attrib_pointer_f32(a_color, 3, glow::FLOAT, false, stride, 12);
    gl.bind_vertex_array(None);
    gl.bind_buffer(glow::ARRAY_BUFFER, None);

    Ok(GpuMesh {
        vao,
        vbo,
        ebo,
        index_count: mesh.indices.len().min(i32::MAX as usize) as i32,
    })
}

fn run_loop(
    sdl: &sdl2::Sdl,
    window: &sdl2::video::Window,
    gl: &GlowBackend,
    shader: &ShaderProgram<'_, GlowBackend>,
    mesh: &GpuMesh,
    config: &DemoConfig,
) -> Result<()> {
    let mut events = sdl
        .event_pump()
        .map_err(|err| miette!("failed to get SDL event pump: {err}"))?;
    let start = Instant::now();
    let mut fps_window_start = Instant::now();
    let mut fps_frames: u32 = 0;

    'main_loop: loop {
        for event in events.poll_iter() {
            match event {
                sdl2::event::Event::Quit { .. } => break 'main_loop,
                sdl2::event::Event::KeyDown {
                    keycode: Some(sdl2::keyboard::Keycode::Escape),
                    ..
                } => break 'main_loop,
                _ => {}
            }
        }

        let (w, h) = window.size();
        let angle = start.elapsed().as_secs_f32() * config.spin_rate;
        let mvp = compute_mvp(w, h, config.fov_deg, config.camera_distance, angle);
        shader.set_uniform_matrix4("u_mvp", &mvp, false);

        unsafe { draw_frame(gl.context(), shader, mesh, w, h, config.clear_color) };
        window.gl_swap_window();

        fps_frames = fps_frames.saturating_add(1);
        let elapsed = fps_window_start.elapsed();
        if elapsed >= Duration::from_secs(2) {
            let fps = fps_frames as f32 / elapsed.as_secs_f32().max(0.000_1);
            log::debug!("fps: {fps:.1} ({:.2} ms)", 1000.0 / fps.max(0.000_1));
            fps_frames = 0;
            fps_window_start = Instant::now();
        }
    }

    Ok(())
}

unsafe fn draw_frame(
    gl: &glow::Context,
    shader: &ShaderProgram<'_, GlowBackend>,
    mesh: &GpuMesh,
    width: u32,
    height: u32,
    clear_color: [f32; 4],
) {
    gl.viewport(
        0,
        0,
        width.min(i32::MAX as u32) as i32,
        height.min(i32::MAX as u32) as i32,
    );
    gl.enable(glow::DEPTH_TEST);
    gl.enable(glow::CULL_FACE);
    let [r, g, b, a] = clear_color;
    gl.clear_color(r, g, b, a);
    gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

    shader.bind();
    gl.bind_vertex_array(Some(mesh.vao));
    gl.draw_elements(glow::TRIANGLES, mesh.index_count, glow::UNSIGNED_SHORT, 0);
    gl.bind_vertex_array(None);
    shader.unbind();
}

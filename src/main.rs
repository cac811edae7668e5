// Copyright 2020 TwoCookingMice

use genoise::core::scene_loader::load_scene;
use genoise::integrators::IntegratorKind;
use genoise::io::exr_utils;
use genoise::renderers::simple::{RenderParams, SimpleRenderer};

use std::env;

fn main() {
    env::set_var("RUST_LOG", "info");
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <scene.xml> <output.exr> [--resolution N] [--samples N] \
                   [--bounces N] [--integrator naive|product|direct|mis] [--camera N] [--sequential]",
                  args[0]);
        std::process::exit(1);
    }

    let input_path = &args[1];
    let output_path = &args[2];
    let mut resolution: usize = 720;
    let mut samples: u32 = 64;
    let mut bounces: u32 = 4;
    let mut integrator_name = String::from("mis");
    let mut camera_id: usize = 0;
    let mut parallel = true;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--resolution" => {
                i += 1;
                resolution = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(resolution);
            }
            "--samples" => {
                i += 1;
                samples = args.get(i).and_then(|v| v.parse::<u32>().ok()).unwrap_or(samples);
            }
            "--bounces" => {
                i += 1;
                bounces = args.get(i).and_then(|v| v.parse::<u32>().ok()).unwrap_or(bounces);
            }
            "--integrator" => {
                i += 1;
                if let Some(name) = args.get(i) {
                    integrator_name = name.clone();
                }
            }
            "--camera" => {
                i += 1;
                camera_id = args.get(i).and_then(|v| v.parse::<usize>().ok()).unwrap_or(camera_id);
            }
            "--sequential" => {
                parallel = false;
            }
            _ => {}
        }
        i += 1;
    }

    // Configuration errors fail before any work is scheduled.
    let integrator = match IntegratorKind::from_name(&integrator_name) {
        Ok(integrator) => integrator,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };

    let scene = load_scene(input_path).expect("failed to load scene");

    let renderer = SimpleRenderer::new(RenderParams {
        resolution,
        samples,
        bounces,
        integrator,
        parallel,
        camera_id,
    });
    let image = match renderer.render(&scene) {
        Ok(image) => image,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(1);
        }
    };
    exr_utils::write_exr_to_file(&image, output_path);
}

/* Copyright 2020 @TwoCookingMice */

use crate::math::bitmap::Bitmap;

use exr::prelude::*;

// Write the finished RGBA image to an OpenEXR file
pub fn write_exr_to_file(image: &Bitmap, file_path: &str) {
    log::info!("Starting writing openexr images: {}.", file_path);

    let write_result = write_rgba_file(file_path, image.width(), image.height(), |x, y| {
        let pixel = image[(x, y)];
        (pixel[0], pixel[1], pixel[2], pixel[3])
    });
    match write_result {
        Ok(()) => println!("EXR written to: {}.", file_path),
        Err(e) => println!("EXR written error: {}.", e.to_string())
    }
}

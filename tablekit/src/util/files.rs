//! Native file dialogs for import, export and image loading.

use std::path::PathBuf;

use anyhow::{Context, Result};

/// Ask for a JSON file and read it. `None` when the dialog was cancelled.
pub fn open_json(title: &str) -> Option<Result<String>> {
	let path = rfd::FileDialog::new()
		.set_title(title)
		.add_filter("JSON", &["json"])
		.pick_file()?;
	Some(std::fs::read_to_string(&path).with_context(|| format!("read {:?}", path)))
}

/// Ask where to save `contents`. Returns the chosen path once written.
pub fn save_json(title: &str, default_name: &str, contents: &str) -> Option<Result<PathBuf>> {
	let path = rfd::FileDialog::new()
		.set_title(title)
		.set_file_name(default_name)
		.add_filter("JSON", &["json"])
		.save_file()?;
	Some(
		std::fs::write(&path, contents)
			.with_context(|| format!("write {:?}", path))
			.map(|()| path),
	)
}

pub fn pick_image(title: &str) -> Option<PathBuf> {
	rfd::FileDialog::new()
		.set_title(title)
		.add_filter("Image", &["png", "jpg", "jpeg", "webp", "bmp"])
		.pick_file()
}

/// Upload an image to the GPU for display.
pub fn load_texture(ctx: &egui::Context, name: &str, image: &ie::OwnedImage) -> egui::TextureHandle {
	let size = [image.width() as usize, image.height() as usize];
	let color = egui::ColorImage::from_rgba_unmultiplied(size, &image.to_rgba_bytes());
	ctx.load_texture(name, color, egui::TextureOptions::LINEAR)
}

use macroquad::prelude::*;
use remnant_tilemap::storage::DirStore;
use remnant_tilemap::{Biome, Editor, Mode};

fn window_conf() -> Conf {
    Conf {
        window_title: "Guardians' Remnant - Map Editor".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    let _ = env_logger::try_init();

    let mut editor = Editor::default();
    let mut store = DirStore::new("saves");
    match editor.load_local(&store) {
        Ok(true) => println!("restored saved map"),
        Ok(false) => {}
        Err(e) => eprintln!("could not restore map: {e}"),
    }

    let frame = editor.render();
    let texture = Texture2D::from_image(&frame);
    texture.set_filter(FilterMode::Nearest);
    let mut status = String::new();

    loop {
        clear_background(BLACK);

        let (fw, fh) = (frame.width as f32, frame.height as f32);
        let scale = ((screen_width() - 40.0) / fw).min((screen_height() - 80.0) / fh).max(0.25);
        let shown = Rect::new(20.0, 60.0, fw * scale, fh * scale);
        let mouse = Vec2::from(mouse_position());

        let mut dirty = false;
        if is_mouse_button_pressed(MouseButton::Left) && shown.contains(mouse) {
            dirty |= editor.pointer_down(mouse, shown);
        } else if is_mouse_button_down(MouseButton::Left) {
            dirty |= editor.pointer_move(mouse, shown);
        }
        if is_mouse_button_released(MouseButton::Left) {
            editor.pointer_up();
        }

        for (key, mode) in [
            (KeyCode::T, Mode::Terrain),
            (KeyCode::O, Mode::Object),
            (KeyCode::E, Mode::Eraser),
        ] {
            if is_key_pressed(key) {
                editor.select_mode(mode);
            }
        }
        for (key, biome) in [
            (KeyCode::Key1, Biome::Overworld),
            (KeyCode::Key2, Biome::Ancient),
            (KeyCode::Key3, Biome::Modern),
        ] {
            if is_key_pressed(key) {
                editor.select_biome(biome);
            }
        }
        if is_key_pressed(KeyCode::Tab) {
            // cycle through the biome's palette for the active layer
            let sel = editor.selection().clone();
            let catalog = editor.catalog();
            let (ids, current) = match sel.mode {
                Mode::Object => (catalog.object_ids(sel.biome).to_vec(), sel.object),
                _ => (catalog.terrain_ids(sel.biome).to_vec(), Some(sel.terrain)),
            };
            let next = current
                .and_then(|c| ids.iter().position(|&i| i == c))
                .map_or(0, |p| (p + 1) % ids.len().max(1));
            if let Some(&id) = ids.get(next) {
                let picked = match sel.mode {
                    Mode::Object => editor.select_object(id),
                    _ => editor.select_terrain(id),
                };
                if let Err(e) = picked {
                    status = e.to_string();
                }
            }
        }
        if is_key_pressed(KeyCode::C) {
            editor.clear();
            dirty = true;
        }
        if is_key_pressed(KeyCode::S) {
            status = match editor.save_local(&mut store) {
                Ok(()) => "saved".into(),
                Err(e) => e.to_string(),
            };
        }
        if is_key_pressed(KeyCode::L) {
            status = match editor.load_local(&store) {
                Ok(true) => "loaded".into(),
                Ok(false) => "nothing saved yet".into(),
                Err(e) => e.to_string(),
            };
            dirty = true;
        }
        if editor.needs_tileset() {
            // blocks this frame only; the placeholder frame is already shown
            if let Err(e) = editor.load_tileset().await {
                eprintln!("{e:#}");
            }
            dirty = true;
        }
        if let Some(reason) = editor.renderer_mut().take_failure_report() {
            status = format!("tileset unavailable: {reason}");
        }

        if dirty {
            texture.update(&editor.render());
        }

        draw_texture_ex(
            &texture,
            shown.x,
            shown.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(shown.w, shown.h)),
                ..Default::default()
            },
        );

        let sel = editor.selection();
        let tool = match sel.mode {
            Mode::Terrain => format!("Terrain: {}", editor.catalog().name(sel.terrain)),
            Mode::Object => match sel.object {
                Some(id) => format!("Object: {}", editor.catalog().name(id)),
                None => "Object: none".to_owned(),
            },
            Mode::Eraser => format!("Eraser ({:?})", sel.last_active),
        };
        draw_text(
            &format!("{} | {} | {}", sel.biome, tool, status),
            20.0,
            35.0,
            28.0,
            WHITE,
        );

        next_frame().await;
    }
}

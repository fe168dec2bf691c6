#![allow(dead_code)]

use chroma_core::{ColorCatalog, Room, RoomRules};
use chroma_types::{ColorPrompt, PlayerId, Rgb};
use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

/// Creates a catalog with a known set of colors
pub fn create_test_catalog() -> ColorCatalog {
    let prompts = vec![
        create_prompt("Black", 0, 0, 0),
        create_prompt("White", 255, 255, 255),
        create_prompt("Red", 255, 0, 0),
        create_prompt("Green", 0, 255, 0),
        create_prompt("Blue", 0, 0, 255),
        create_prompt("Grey", 128, 128, 128),
    ];
    ColorCatalog::new(prompts).unwrap()
}

pub fn create_prompt(name: &str, r: u8, g: u8, b: u8) -> ColorPrompt {
    ColorPrompt {
        name: name.to_string(),
        description: format!("Plain {}", name.to_lowercase()),
        rgb: Rgb::new(r, g, b),
    }
}

/// Creates a lobby hosted by the first name with the rest already joined.
/// Returns the room and the player ids in join order.
pub fn create_room_with_players(names: &[&str]) -> (Room, Vec<PlayerId>) {
    let catalog = create_test_catalog();
    let rules = RoomRules::default();
    let mut rng = StdRng::seed_from_u64(1);
    let colors = catalog.draw(rules.max_rounds as usize, &mut rng);

    let host_id = Uuid::new_v4();
    let mut room = Room::new(
        "room01".to_string(),
        host_id,
        names[0].to_string(),
        colors,
        rules,
    )
    .unwrap();

    let mut ids = vec![host_id];
    for name in &names[1..] {
        let player = room.add_player(Uuid::new_v4(), name.to_string());
        ids.push(player.id);
    }

    (room, ids)
}

/// Creates a room that has already started
pub fn create_started_room(names: &[&str]) -> (Room, Vec<PlayerId>) {
    let (mut room, ids) = create_room_with_players(names);
    room.start_game(names[0]).unwrap();
    (room, ids)
}

/// A guess at a fixed distance from the target along the red channel
pub fn offset_guess(target: Rgb, offset: u8) -> Rgb {
    if target.r >= offset {
        Rgb::new(target.r - offset, target.g, target.b)
    } else {
        Rgb::new(target.r + offset, target.g, target.b)
    }
}

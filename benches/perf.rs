use std::time::Instant;

use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use roster_terminal::demo_feed::seed_players;
use roster_terminal::paging::FetchController;
use roster_terminal::player_fetch::parse_players_page_json;
use roster_terminal::roster::{Roster, TeamDraft};
use roster_terminal::state::PlayerPage;

const PAGE_JSON: &str = r#"{
  "data": [
    {"id": 1, "first_name": "Alex", "last_name": "Stone", "position": "G", "team": {"id": 1, "name": "Hawks"}},
    {"id": 2, "first_name": "Bo", "last_name": "Vega", "position": "F", "team": {"id": 2, "name": "Celtics"}},
    {"id": 3, "first_name": "Cam", "last_name": "Holt", "position": null, "team": {"id": 10, "name": "Warriors"}}
  ],
  "meta": {"next_cursor": 3, "per_page": 3}
}"#;

fn bench_page_parse(c: &mut Criterion) {
    c.bench_function("players_page_parse", |b| {
        b.iter(|| {
            let page = parse_players_page_json(black_box(PAGE_JSON)).unwrap();
            black_box(page.players.len());
        })
    });
}

fn bench_controller_append(c: &mut Criterion) {
    let players = seed_players(500);
    let pages: Vec<PlayerPage> = players
        .chunks(25)
        .enumerate()
        .map(|(idx, chunk)| PlayerPage {
            players: chunk.to_vec(),
            next_cursor: (idx < 19).then(|| ((idx + 1) * 25).to_string()),
        })
        .collect();

    c.bench_function("controller_append_20_pages", |b| {
        b.iter(|| {
            let now = Instant::now();
            let mut controller = FetchController::new(25);
            for page in &pages {
                let req = controller.load_next().unwrap();
                controller.on_response(req.ticket, Ok(page.clone()), now);
            }
            black_box(controller.players().count());
        })
    });
}

fn bench_roster_assign(c: &mut Criterion) {
    let players = seed_players(200);

    c.bench_function("roster_assign_and_delete", |b| {
        b.iter(|| {
            let mut roster = Roster::new();
            let now = Utc::now();
            let ids: Vec<String> = (0..10)
                .map(|n| {
                    roster
                        .create_team(
                            TeamDraft {
                                name: format!("Team {n}"),
                                player_count: "0".to_string(),
                                region: "West".to_string(),
                                country: "USA".to_string(),
                            },
                            now,
                        )
                        .unwrap()
                })
                .collect();
            for (idx, player) in players.iter().enumerate() {
                roster
                    .add_player_to_team(&ids[idx % ids.len()], player.clone())
                    .unwrap();
            }
            for id in &ids {
                roster.delete_team(id).unwrap();
            }
            black_box(roster.assigned_player_ids().len());
        })
    });
}

criterion_group!(
    benches,
    bench_page_parse,
    bench_controller_append,
    bench_roster_assign
);
criterion_main!(benches);

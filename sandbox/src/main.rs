// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Simulated dungeon session exercising the event dispatcher and telemetry.

use anyhow::Result;
use delve_sdk::prelude::*;
use std::cell::Cell;
use std::hint::black_box;
use std::rc::Rc;

const FRAME_TIME: f64 = 1.0 / 60.0;
const SESSION_FRAMES: u64 = 600;
const MONSTER_COUNT: usize = 8;

fn tag(name: &str) -> Result<EventTag> {
    Ok(EventTag::new(name)?)
}

/// Burns a little CPU so system timings are not all zero.
fn simulate_work(iterations: u64) -> u64 {
    (0..iterations).fold(0u64, |acc, i| black_box(acc.wrapping_add(i * i)))
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let mut runtime = DelveRuntime::new(RuntimeConfig::default());
    runtime.telemetry_mut().register_system("Combat", 2.0)?;
    runtime.telemetry_mut().register_system("AI", 1.5)?;

    let player = ObjectToken::new("Player");
    let mut monsters: Vec<ObjectToken> = (0..MONSTER_COUNT)
        .map(|i| ObjectToken::new(format!("Goblin{i}")))
        .collect();

    let damage_dealt = Rc::new(Cell::new(0.0f32));
    let experience = Rc::new(Cell::new(0u32));

    // UI wants every combat event first.
    let hits = Rc::new(Cell::new(0u32));
    let ui_hits = hits.clone();
    runtime.events().register_listener(
        &tag("Game.Combat")?,
        move |_| ui_hits.set(ui_hits.get() + 1),
        &player,
        ListenerPriority::High,
        None,
    )?;

    let dealt = damage_dealt.clone();
    runtime.events().register_listener_with(
        &tag("Game.Combat.Damage")?,
        &player,
        ListenerOptions::default().filtered(EventFilter::for_actor(&player)),
        move |payload| {
            if let PayloadData::Damage(damage) = &payload.data {
                dealt.set(dealt.get() + damage.amount);
            }
        },
    )?;

    let xp = experience.clone();
    runtime.events().register_listener(
        &tag("Game.Progression.Kill")?,
        move |payload| {
            if let PayloadData::Kill(kill) = &payload.data {
                xp.set(xp.get() + kill.experience_reward);
            }
        },
        &player,
        ListenerPriority::Normal,
        None,
    )?;

    // Each monster listens for attacks until it dies.
    for monster in &monsters {
        let name = monster.name().to_string();
        runtime.events().register_listener(
            &tag("Game.Combat.Attack")?,
            move |_| log::trace!("{name} braces for impact."),
            monster,
            ListenerPriority::Low,
            None,
        )?;
    }

    let damage_tag = tag("Game.Combat.Damage.Dealt")?;
    let attack_tag = tag("Game.Combat.Attack")?;
    let kill_tag = tag("Game.Progression.Kill")?;

    for frame in 1..=SESSION_FRAMES {
        let now = runtime.telemetry().session_time();

        // Combat resolves in a batch at the end of the frame.
        runtime.events().enable_deferred_mode();
        let events = runtime.events().clone();
        let targets: Vec<ObjectRef> = monsters.iter().map(ObjectRef::from).collect();
        runtime.telemetry_mut().time_system("Combat", || {
            simulate_work(2_000);
            events.broadcast_event(
                &EventPayload::attack(
                    attack_tag.clone(),
                    Some(player.downgrade()),
                    Vec3::new(0.0, 0.0, 0.0),
                    3.0,
                )
                .with_timestamp(now),
            );
            if let Some(target) = targets.first() {
                events.broadcast_event(
                    &EventPayload::damage(
                        damage_tag.clone(),
                        Some(player.downgrade()),
                        Some(target.clone()),
                        12.5,
                        "Pickaxe",
                    )
                    .with_timestamp(now),
                );
            }
        });
        runtime.events().disable_deferred_mode();

        runtime
            .telemetry_mut()
            .time_system("AI", || simulate_work(1_000 * monsters.len() as u64));

        // A goblin falls every 60 frames.
        if frame % 60 == 0 && !monsters.is_empty() {
            let fallen = monsters.remove(0);
            runtime.broadcast(
                &EventPayload::kill(
                    kill_tag.clone(),
                    Some(player.downgrade()),
                    Some(fallen.downgrade()),
                    25,
                )
                .with_timestamp(now),
            );
            drop(fallen);
            runtime.telemetry_mut().track_deallocation("Monsters", 4 * 1024);
        } else if frame == 1 {
            runtime
                .telemetry_mut()
                .track_allocation("Monsters", (MONSTER_COUNT * 4 * 1024) as u64);
        }
        runtime
            .telemetry_mut()
            .track_entity_count("Monsters", monsters.len() as u64);

        // Periodic hitch.
        let delta = if frame % 90 == 0 {
            3.0 * FRAME_TIME
        } else {
            FRAME_TIME
        };
        runtime.tick(delta);

        if frame == 120 {
            runtime.telemetry_mut().capture_baseline("warmup")?;
        }
    }

    let comparison = runtime.telemetry().compare_to_baseline("warmup")?;
    log::info!(
        "Against warmup: FPS {:+.1}%, frame time {:+.1}%, regression: {}",
        comparison.fps_change_percent,
        comparison.frame_time_change_percent,
        comparison.is_regression
    );
    log::info!(
        "Player dealt {:.1} damage over {} combat events and earned {} XP.",
        damage_dealt.get(),
        hits.get(),
        experience.get()
    );
    log::info!(
        "{} stale listener(s) swept at shutdown.",
        runtime.events().cleanup_stale_listeners()
    );

    runtime.log_summary();
    log::debug!("{}", runtime.report().to_json()?);
    Ok(())
}

//! Pairwise Encounter Resolver
//!
//! Station-hosted and wild encounter trials, ally-assist pre-emption, pair
//! locking, separation, and flee. All sampling is Poisson per tick against the
//! injected RNG; all pair and ally scans walk the roster in spawn order, which
//! is the documented tie-break.

use bevy_ecs::prelude::*;
use rand::rngs::SmallRng;
use rand::Rng;
use std::f32::consts::TAU;

use menagerie_events::{EncounterKind, NeedKind, SimEvent};

use crate::components::agent::{
    AgentId, Behavior, Dragging, Engagement, EventCooldown, Intent, IntentGoal, Needs, Position,
    Velocity,
};
use crate::components::arena::{AgentRoster, SimClock, Station, StationRegistry};
use crate::components::relations::{RelationLedger, Standing};
use crate::config::Config;
use crate::events::TickEvents;
use crate::SimRng;

/// One Poisson trial: triggers with probability `1 - e^(-rate * dt)`.
pub fn poisson_trial<R: Rng>(rng: &mut R, rate_per_s: f32, dt: f32) -> bool {
    rng.gen::<f32>() < 1.0 - (-rate_per_s * dt).exp()
}

/// Whether an agent may enter a new encounter right now: not held, in a free
/// state, and past its event gate.
pub fn is_eligible(world: &World, entity: Entity, now_ms: f64) -> bool {
    let Some(dragging) = world.get::<Dragging>(entity) else {
        return false;
    };
    if dragging.0 {
        return false;
    }
    let Some(gate) = world.get::<EventCooldown>(entity) else {
        return false;
    };
    if gate.blocks(now_ms) {
        return false;
    }
    world
        .get::<Behavior>(entity)
        .is_some_and(|b| b.is_free())
}

/// System: replenish needs at stations and run station-hosted encounter trials.
pub fn station_encounters(world: &mut World) {
    let clock = *world.resource::<SimClock>();
    let now = clock.now_ms;
    let dt = clock.dt;
    let config = world.resource::<Config>().clone();
    let stations: Vec<Station> = world.resource::<StationRegistry>().all().to_vec();
    let roster = world.resource::<AgentRoster>().entities();
    let radius = config.arena.interaction_radius;

    world.resource_scope(|world, mut rng: Mut<SimRng>| {
        for station in &stations {
            let nearby: Vec<Entity> = roster
                .iter()
                .copied()
                .filter(|&entity| {
                    is_eligible(world, entity, now)
                        && world.get::<Position>(entity).is_some_and(|p| {
                            p.distance_to_point(station.x, station.y) < radius
                        })
                })
                .collect();

            for &entity in &nearby {
                replenish(world, entity, station.kind, dt, &config);
            }

            for i in 0..nearby.len() {
                for j in (i + 1)..nearby.len() {
                    let (a, b) = (nearby[i], nearby[j]);
                    // An earlier pair in this tick may already have locked or
                    // redirected one of them; stale members must not re-lock.
                    if !is_eligible(world, a, now) || !is_eligible(world, b, now) {
                        continue;
                    }
                    if !poisson_trial(&mut rng.0, config.encounter.station_rate, dt) {
                        continue;
                    }
                    if rng.0.gen::<f32>() < config.encounter.fight_bias(station.kind) {
                        start_fight(world, &mut rng.0, a, b, Some(station.kind), now, &config);
                    } else {
                        lock_pair(
                            world,
                            a,
                            b,
                            EncounterKind::Friendly,
                            Some(station.kind),
                            now,
                            &config,
                        );
                    }
                }
            }
        }
    });
}

/// Tops up the matching need; a sated agent loses interest in the station.
fn replenish(world: &mut World, entity: Entity, kind: NeedKind, dt: f32, config: &Config) {
    let Some(mut needs) = world.get_mut::<Needs>(entity) else {
        return;
    };
    let value = needs.get(kind) + config.needs.replenish_rate * dt;
    needs.set(kind, value);
    if needs.get(kind) <= config.needs.sated_threshold {
        return;
    }
    if let Some(mut intent) = world.get_mut::<Intent>(entity) {
        intent.goal = IntentGoal::Wander;
    }
    if let Some(mut behavior) = world.get_mut::<Behavior>(entity) {
        if !matches!(*behavior, Behavior::Cooldown) {
            *behavior = Behavior::Wander;
        }
    }
}

/// System: encounter trials for pairs away from every station.
pub fn wild_encounters(world: &mut World) {
    let clock = *world.resource::<SimClock>();
    let now = clock.now_ms;
    let dt = clock.dt;
    let config = world.resource::<Config>().clone();
    let stations: Vec<Station> = world.resource::<StationRegistry>().all().to_vec();
    let roster = world.resource::<AgentRoster>().entities();
    let radius = config.arena.interaction_radius;
    let wild_range = radius * config.encounter.wild_range_factor;

    world.resource_scope(|world, mut rng: Mut<SimRng>| {
        for i in 0..roster.len() {
            for j in (i + 1)..roster.len() {
                let (a, b) = (roster[i], roster[j]);
                if !is_eligible(world, a, now) || !is_eligible(world, b, now) {
                    continue;
                }
                let (Some(pa), Some(pb)) = (
                    world.get::<Position>(a).copied(),
                    world.get::<Position>(b).copied(),
                ) else {
                    continue;
                };
                let on_station = |p: &Position| {
                    stations
                        .iter()
                        .any(|s| p.distance_to_point(s.x, s.y) < radius)
                };
                if on_station(&pa) || on_station(&pb) {
                    continue;
                }
                if pa.distance_to(&pb) > wild_range {
                    continue;
                }
                if !poisson_trial(&mut rng.0, config.encounter.wild_rate, dt) {
                    continue;
                }
                if rng.0.gen::<f32>() < config.encounter.wild_fight_bias {
                    start_fight(world, &mut rng.0, a, b, None, now, &config);
                } else {
                    lock_pair(world, a, b, EncounterKind::Friendly, None, now, &config);
                }
            }
        }
    });
}

/// A pending fight resolved in favor of a bystander.
struct AllyIntervention {
    ally: Entity,
    protected: Entity,
    fled: Entity,
}

/// Resolves a pending fight: a nearby friend of either combatant cancels the
/// lock and routs the unbefriended side; otherwise the pair locks into a fight.
pub fn start_fight(
    world: &mut World,
    rng: &mut SmallRng,
    a: Entity,
    b: Entity,
    station: Option<NeedKind>,
    now_ms: f64,
    config: &Config,
) {
    if let Some(intervention) = find_ally(world, a, b, now_ms, config) {
        let ally_id = agent_label(world, intervention.ally);
        let protected_id = agent_label(world, intervention.protected);
        let fled_id = agent_label(world, intervention.fled);

        force_flee(world, rng, intervention.fled, now_ms, config);
        if let Some(mut behavior) = world.get_mut::<Behavior>(intervention.ally) {
            *behavior = Behavior::Cooldown;
        }
        tracing::debug!(
            ally = %ally_id,
            protected = %protected_id,
            fled = %fled_id,
            "ally intervention cancelled a fight"
        );
        world.resource_mut::<TickEvents>().push(SimEvent::AllyIntervened {
            ally: ally_id,
            protected: protected_id,
            fled: fled_id,
        });
        return;
    }
    lock_pair(world, a, b, EncounterKind::Fight, station, now_ms, config);
}

/// First eligible friend of either combatant within assist range, roster order.
fn find_ally(
    world: &World,
    a: Entity,
    b: Entity,
    now_ms: f64,
    config: &Config,
) -> Option<AllyIntervention> {
    let ledger = world.resource::<RelationLedger>();
    let roster = world.resource::<AgentRoster>();
    let pa = world.get::<Position>(a).copied()?;
    let pb = world.get::<Position>(b).copied()?;
    let a_id = world.get::<AgentId>(a)?.0.clone();
    let b_id = world.get::<AgentId>(b)?.0.clone();
    let range = config.arena.interaction_radius * config.encounter.ally_range_factor;

    for candidate in roster.iter() {
        if candidate == a || candidate == b {
            continue;
        }
        if !is_eligible(world, candidate, now_ms) {
            continue;
        }
        let Some(pc) = world.get::<Position>(candidate) else {
            continue;
        };
        if pc.distance_to(&pa) >= range && pc.distance_to(&pb) >= range {
            continue;
        }
        let Some(c_id) = world.get::<AgentId>(candidate) else {
            continue;
        };
        let friend_of_a = ledger.is_friend(&c_id.0, &a_id);
        if !friend_of_a && !ledger.is_friend(&c_id.0, &b_id) {
            continue;
        }
        // The combatant without the friend is the one who runs.
        let (protected, fled) = if friend_of_a { (a, b) } else { (b, a) };
        return Some(AllyIntervention {
            ally: candidate,
            protected,
            fled,
        });
    }
    None
}

/// Locks both agents into a timed encounter and records the standing.
pub fn lock_pair(
    world: &mut World,
    a: Entity,
    b: Entity,
    kind: EncounterKind,
    station: Option<NeedKind>,
    now_ms: f64,
    config: &Config,
) {
    let (Some(a_id), Some(b_id)) = (
        world.get::<AgentId>(a).map(|id| id.0.clone()),
        world.get::<AgentId>(b).map(|id| id.0.clone()),
    ) else {
        return;
    };
    let (Some(pa), Some(pb)) = (
        world.get::<Position>(a).copied(),
        world.get::<Position>(b).copied(),
    ) else {
        return;
    };
    let ends_at_ms = now_ms + config.timing.engage_ms;

    lock_one(world, a, Engagement {
        kind,
        partner: b,
        partner_id: b_id.clone(),
        lock_x: pa.x,
        lock_y: pa.y,
        ends_at_ms,
    });
    lock_one(world, b, Engagement {
        kind,
        partner: a,
        partner_id: a_id.clone(),
        lock_x: pb.x,
        lock_y: pb.y,
        ends_at_ms,
    });

    world
        .resource_mut::<RelationLedger>()
        .record_mutual(&a_id, &b_id, Standing::from(kind));
    tracing::debug!(kind = %kind, a = %a_id, b = %b_id, "encounter locked");
    world
        .resource_mut::<TickEvents>()
        .push(SimEvent::EncounterStarted {
            kind,
            a: a_id,
            b: b_id,
            station,
        });
}

fn lock_one(world: &mut World, entity: Entity, engagement: Engagement) {
    if let Some(mut behavior) = world.get_mut::<Behavior>(entity) {
        *behavior = Behavior::Engaged(engagement);
    }
    if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
        *vel = Velocity::zero();
    }
}

/// Pushes an ended pair apart and applies the post-interaction bookkeeping.
pub fn separate_pair(
    world: &mut World,
    rng: &mut SmallRng,
    a: Entity,
    b: Entity,
    now_ms: f64,
    config: &Config,
    forced: bool,
) {
    let (Some(pa), Some(pb)) = (
        world.get::<Position>(a).copied(),
        world.get::<Position>(b).copied(),
    ) else {
        return;
    };
    let mut dx = pa.x - pb.x;
    let mut dy = pa.y - pb.y;
    let mut d = dx.hypot(dy);
    if d == 0.0 {
        // Coincident pair: pick an arbitrary axis instead of dividing by zero.
        let angle = rng.gen_range(0.0..TAU);
        dx = angle.cos();
        dy = angle.sin();
        d = 1.0;
    }
    let (nx, ny) = (dx / d, dy / d);
    let speed = config.movement.nominal_speed * config.movement.separation_factor;

    apply_separation(world, rng, a, nx * speed, ny * speed, now_ms, config);
    apply_separation(world, rng, b, -nx * speed, -ny * speed, now_ms, config);

    let a_id = agent_label(world, a);
    let b_id = agent_label(world, b);
    tracing::debug!(a = %a_id, b = %b_id, forced, "pair separated");
    world
        .resource_mut::<TickEvents>()
        .push(SimEvent::PairSeparated {
            a: a_id,
            b: b_id,
            forced,
        });
}

/// Separation for an agent whose partner is already gone.
pub fn self_separate(
    world: &mut World,
    rng: &mut SmallRng,
    entity: Entity,
    now_ms: f64,
    config: &Config,
) {
    let angle = rng.gen_range(0.0..TAU);
    let speed = config.movement.nominal_speed * config.movement.separation_factor;
    apply_separation(
        world,
        rng,
        entity,
        angle.cos() * speed,
        angle.sin() * speed,
        now_ms,
        config,
    );
    let agent = agent_label(world, entity);
    tracing::debug!(agent = %agent, "self-separated from a vanished partner");
    world
        .resource_mut::<TickEvents>()
        .push(SimEvent::SelfSeparated { agent });
}

fn apply_separation(
    world: &mut World,
    rng: &mut SmallRng,
    entity: Entity,
    vx: f32,
    vy: f32,
    now_ms: f64,
    config: &Config,
) {
    if let Some(mut behavior) = world.get_mut::<Behavior>(entity) {
        *behavior = Behavior::Separate {
            until_ms: now_ms + config.timing.separate_ms,
        };
    }
    if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
        vel.x = vx;
        vel.y = vy;
    }
    if let Some(mut gate) = world.get_mut::<EventCooldown>(entity) {
        gate.extend_to(
            now_ms + rng.gen_range(config.timing.no_event_min_ms..config.timing.no_event_max_ms),
        );
    }
    if let Some(mut intent) = world.get_mut::<Intent>(entity) {
        intent.goal = IntentGoal::Wander;
        intent.until_ms = now_ms
            + rng.gen_range(
                config.intent.post_separation_min_ms..config.intent.post_separation_max_ms,
            );
    }
}

/// Routs an agent out of a cancelled fight.
pub fn force_flee(
    world: &mut World,
    rng: &mut SmallRng,
    entity: Entity,
    now_ms: f64,
    config: &Config,
) {
    if let Some(mut behavior) = world.get_mut::<Behavior>(entity) {
        *behavior = Behavior::Flee {
            until_ms: now_ms + config.timing.flee_ms,
        };
    }
    let pos = world.get::<Position>(entity).copied().unwrap_or(Position::new(0.0, 0.0));
    let angle = pos.y.atan2(pos.x) + rng.gen_range(-0.8_f32..0.8_f32);
    let speed = config
        .movement
        .flee_speed_floor
        .max(config.movement.nominal_speed * config.movement.flee_factor);
    if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
        vel.x = angle.cos() * speed;
        vel.y = angle.sin() * speed;
    }
    // Gate immediately so the agent cannot be re-engaged the moment it stops.
    if let Some(mut gate) = world.get_mut::<EventCooldown>(entity) {
        gate.extend_to(
            now_ms + rng.gen_range(config.timing.no_event_min_ms..config.timing.no_event_max_ms),
        );
    }
}

fn agent_label(world: &World, entity: Entity) -> String {
    world
        .get::<AgentId>(entity)
        .map(|id| id.0.clone())
        .unwrap_or_else(|| format!("{entity:?}"))
}

use crate::core::physics::PhysicsWorld;
use crate::core::scene::PartSet;

/// Per-step forces from wheels and thrusters. Call before each physics step.
/// A motor at top speed gets no more torque.
///
/// Accumulated forces are cleared on every body first so a motor that was
/// switched off stops pushing on the very next step.
pub fn apply_actuators(parts: &PartSet, physics: &mut PhysicsWorld) {
    for part in parts.iter() {
        let Some(body) = part.body else { continue };
        physics.reset_forces(body.id);
        if let Some((torque, max_speed)) = part.motor() {
            let spin = physics.angular_velocity(body.id);
            if spin.abs() < max_speed || spin.signum() != torque.signum() {
                physics.apply_torque(body.id, torque);
            }
        }
        if let Some(force) = part.thrust() {
            physics.apply_force(body.id, force);
        }
    }
}

/// Hold running motors to their top speed. Call after each physics step.
pub fn clamp_motor_speeds(parts: &PartSet, physics: &mut PhysicsWorld) {
    for part in parts.iter() {
        let (Some(body), Some((_, max_speed))) = (part.body, part.motor()) else {
            continue;
        };
        let spin = physics.angular_velocity(body.id);
        if spin.abs() > max_speed {
            physics.set_angular_velocity(body.id, spin.clamp(-max_speed, max_speed));
        }
    }
}

/// Copy body transforms back into every part after a step.
pub fn sync_parts(parts: &mut PartSet, physics: &PhysicsWorld) {
    for part in parts.iter_mut() {
        part.sync_from_physics(physics);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::PartId;
    use crate::components::part::Part;
    use crate::geometry::Bounds;
    use glam::Vec2;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn motor_spins_wheel_up_to_cap() {
        let mut physics = PhysicsWorld::new(Vec2::ZERO);
        let mut parts = PartSet::new();
        let mut wheel = Part::wheel(PartId(1), Vec2::ZERO, 20.0);
        wheel.enable_physics(&mut physics);
        wheel.on_connect(0);
        let body = wheel.body.unwrap().id;
        let cap = wheel.motor().unwrap().1;
        parts.push(wheel);
        for _ in 0..240 {
            apply_actuators(&parts, &mut physics);
            physics.step();
            clamp_motor_speeds(&parts, &mut physics);
            let spin = physics.angular_velocity(body);
            assert!(spin <= cap + 1e-4, "never above max speed: {spin}");
        }
        let spin = physics.angular_velocity(body);
        assert!(spin > 0.0, "spin_dir 1 turns clockwise on screen: {spin}");
    }

    #[test]
    fn firing_thruster_pushes_along_its_rotated_up() {
        let mut physics = PhysicsWorld::new(Vec2::ZERO);
        let mut parts = PartSet::new();
        let mut thruster = Part::thruster(PartId(1), Vec2::ZERO, 20.0).with_rotation(FRAC_PI_2);
        thruster.enable_physics(&mut physics);
        thruster.on_connect(0);
        let body = thruster.body.unwrap().id;
        let dir = thruster.thrust().unwrap().normalize();
        assert!((dir - Vec2::X).length() < 1e-5, "quarter turn points up at +x: {dir}");
        parts.push(thruster);
        for _ in 0..10 {
            apply_actuators(&parts, &mut physics);
            physics.step();
        }
        let v = physics.velocity(body);
        assert!(v.x > 0.0, "pushed along +x: {v}");
        assert!(v.y.abs() < 1e-3 * v.x, "nothing sideways: {v}");

        parts.get_mut(PartId(1)).unwrap().on_disconnect(0, &[]);
        assert!(parts.get(PartId(1)).unwrap().thrust().is_none());
        for _ in 0..10 {
            apply_actuators(&parts, &mut physics);
            physics.step();
        }
        let coasting = physics.velocity(body);
        assert!((coasting - v).length() < 1e-3, "no thrust once disconnected: {coasting} vs {v}");
    }

    #[test]
    fn idle_parts_get_no_force() {
        let mut physics = PhysicsWorld::new(Vec2::ZERO);
        let mut parts = PartSet::new();
        let mut thruster = Part::thruster(PartId(1), Vec2::ZERO, 20.0);
        thruster.enable_physics(&mut physics);
        let body = thruster.body.unwrap().id;
        parts.push(thruster);
        for _ in 0..10 {
            apply_actuators(&parts, &mut physics);
            physics.step();
        }
        assert_eq!(physics.velocity(body), Vec2::ZERO);
    }

    #[test]
    fn sync_copies_body_transform() {
        let mut physics = PhysicsWorld::new(Vec2::new(0.0, 500.0));
        let mut parts = PartSet::new();
        let mut block = Part::rect(PartId(1), Bounds::from_center(Vec2::ZERO, Vec2::splat(10.0)));
        block.enable_physics(&mut physics);
        parts.push(block);
        for _ in 0..30 {
            physics.step();
        }
        sync_parts(&mut parts, &physics);
        assert!(parts.get(PartId(1)).unwrap().pos.y > 0.0, "fell under gravity");
    }
}

//! Development tools for the sandbox. This plugin is only enabled in dev builds.

use avian2d::prelude::PhysicsGizmos;
use bevy::{
    ecs::entity::EntityHashMap, input::common_conditions::input_just_pressed, prelude::*,
};
use bevy_inspector_egui::bevy_egui::EguiPlugin;
use kcc2d::prelude::*;

pub(super) fn plugin(app: &mut App) {
    // Toggle the collider overlay.
    app.add_systems(
        Update,
        toggle_physics_gizmos.run_if(input_just_pressed(TOGGLE_KEY)),
    );
    app.add_systems(FixedUpdate, log_flags.after(CharacterSystems::Move));
    //inspect stuff and things
    app.add_plugins((
        EguiPlugin::default(),
        bevy_inspector_egui::quick::WorldInspectorPlugin::new(),
    ));
}

const TOGGLE_KEY: KeyCode = KeyCode::Backquote;

fn toggle_physics_gizmos(mut store: ResMut<GizmoConfigStore>) {
    let (config, _) = store.config_mut::<PhysicsGizmos>();
    config.enabled = !config.enabled;
}

fn log_flags(
    characters: Query<(Entity, &Name, &CharacterController)>,
    mut last: Local<EntityHashMap<(CollisionFlags, bool)>>,
) {
    for (entity, name, controller) in &characters {
        let state = (controller.collision_flags(), controller.is_grounded());
        if last.insert(entity, state) != Some(state) {
            debug!(flags = ?state.0, grounded = state.1, "{name}");
        }
    }
}

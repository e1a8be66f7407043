/*
 * This file is part of Radeon Monitor.
 *
 * Copyright (C) 2025 Radeon Monitor contributors
 *
 * Radeon Monitor is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Radeon Monitor is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Radeon Monitor. If not, see <https://www.gnu.org/licenses/>.
 */

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::App;
use crate::config::FanMode;
use crate::device::Device;
use crate::scheduler::{RefreshScheduler, UserIntent};

/// Turns a key press into a flag change or a scheduler intent.
/// Returns `Ok(true)` when the user asked to quit.
pub fn handle_key_event<D: Device>(
    app: &mut App,
    sched: &mut RefreshScheduler<D>,
    key_event: KeyEvent,
) -> anyhow::Result<bool> {
    let KeyEvent { code, modifiers, .. } = key_event;

    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(true);
    }

    let intent = match code {
        KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
        KeyCode::Char('s') => {
            app.flags.stats_tracking = !app.flags.stats_tracking;
            None
        }
        KeyCode::Char('v') => {
            app.flags.stats_view_active = !app.flags.stats_view_active;
            None
        }
        KeyCode::Char('w') => {
            app.flags.refresh_when_hidden = !app.flags.refresh_when_hidden;
            None
        }
        KeyCode::Char('h') => {
            app.window.hidden = !app.window.hidden;
            app.window.minimized = false;
            None
        }
        KeyCode::Char('a') => Some(UserIntent::SetFanMode(FanMode::Auto)),
        KeyCode::Char('f') => Some(UserIntent::SetFanMode(FanMode::Fixed)),
        KeyCode::Char('c') => Some(UserIntent::SetFanMode(FanMode::Curve)),
        KeyCode::Char('r') => Some(UserIntent::ResetStats),
        KeyCode::Char('p') => next_profile(sched).map(UserIntent::SelectFanProfile),
        KeyCode::Char('+') => Some(UserIntent::SetHysteresis(app.hysteresis.saturating_add(1))),
        KeyCode::Char('-') => Some(UserIntent::SetHysteresis(app.hysteresis.saturating_sub(1))),
        KeyCode::Up => Some(UserIntent::SetFixedFanSpeed(app.fixed_fan_speed.saturating_add(5).min(100))),
        KeyCode::Down => Some(UserIntent::SetFixedFanSpeed(
            app.fixed_fan_speed.saturating_sub(5).max(sched.config().min_fan_speed),
        )),
        _ => None,
    };

    if let Some(intent) = intent {
        if let Err(e) = sched.apply_intent(intent) {
            app.push_notice(e.to_string());
        }
        app.sync_from(sched);
    }
    Ok(false)
}

fn next_profile<D: Device>(sched: &RefreshScheduler<D>) -> Option<String> {
    let names = sched.config().profile_names();
    if names.len() < 2 {
        return None;
    }
    let current = &sched.config().active_fan_profile;
    let idx = names.iter().position(|n| n == current).unwrap_or(0);
    names.get((idx + 1) % names.len()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::CurvePoint;
    use crate::device::FanCommand;
    use crate::scheduler::WindowState;
    use crate::test_utils::test_utils::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn setup() -> (App, RefreshScheduler<crate::device::ScriptedDevice>) {
        let cfg = create_reference_config();
        let app = App::new(&cfg, false);
        let mut sched = RefreshScheduler::new(create_scripted_device(&[50.0]), cfg);
        let mut sink = RecordingSink::default();
        sched.tick(&app.flags, WindowState::default(), &mut sink);
        (app, sched)
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, mut sched) = setup();
        assert!(handle_key_event(&mut app, &mut sched, key('q')).unwrap());
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(handle_key_event(&mut app, &mut sched, ctrl_c).unwrap());
    }

    #[test]
    fn test_toggles() {
        let (mut app, mut sched) = setup();
        handle_key_event(&mut app, &mut sched, key('s')).unwrap();
        handle_key_event(&mut app, &mut sched, key('v')).unwrap();
        handle_key_event(&mut app, &mut sched, key('w')).unwrap();
        handle_key_event(&mut app, &mut sched, key('h')).unwrap();
        assert!(app.flags.stats_tracking);
        assert!(app.flags.stats_view_active);
        assert!(app.flags.refresh_when_hidden);
        assert!(app.window.hidden);
    }

    #[test]
    fn test_curve_mode_key() {
        let (mut app, mut sched) = setup();
        handle_key_event(&mut app, &mut sched, key('c')).unwrap();
        assert!(app.flags.fan_profile_mode);
        assert_eq!(app.fan_mode, FanMode::Curve);
        assert_eq!(sched.device().fan_commands(), &[FanCommand::Duty(45)]);

        handle_key_event(&mut app, &mut sched, key('a')).unwrap();
        assert!(!app.flags.fan_profile_mode);
    }

    #[test]
    fn test_hysteresis_keys() {
        let (mut app, mut sched) = setup();
        handle_key_event(&mut app, &mut sched, key('+')).unwrap();
        assert_eq!(app.hysteresis, 6);
        assert_eq!(sched.config().hysteresis, 6);
    }

    #[test]
    fn test_profile_cycling() {
        let (mut app, mut sched) = setup();
        handle_key_event(&mut app, &mut sched, key('p')).unwrap();
        assert_eq!(app.active_profile, "default");

        sched
            .apply_intent(UserIntent::ReplaceCurve(vec![CurvePoint::new(30, 30)]))
            .unwrap();
        let mut cfg = sched.config().clone();
        cfg.fan_profiles.insert("silent".into(), vec![CurvePoint::new(50, 20)]);
        let mut sched = RefreshScheduler::new(create_scripted_device(&[50.0]), cfg);
        handle_key_event(&mut app, &mut sched, key('p')).unwrap();
        assert_eq!(app.active_profile, "silent");
    }

    #[test]
    fn test_rejected_intent_becomes_notice() {
        let (mut app, mut sched) = setup();
        sched.apply_intent(UserIntent::ReplaceCurve(vec![])).unwrap();
        handle_key_event(&mut app, &mut sched, key('c')).unwrap();
        assert_eq!(app.notices.len(), 1);
        assert_eq!(app.fan_mode, FanMode::Auto);
    }
}

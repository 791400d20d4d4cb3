//! Screen-anchored placement of auxiliary objects
//!
//! Anchors are pinned to a normalized screen position and a distance from
//! the camera, so they stay put on screen whatever the body's alignment
//! rotation does. The camera is owned elsewhere and changes often; the
//! projector remembers the camera it last used and recomputes every
//! placement when that changes.

use glam::DVec3;
use serde::{Deserialize, Serialize};
use selene_core::{DomainError, EngineError, Status};

use crate::camera::Camera;

/// Normalized screen point (u right, v down, 0..1) plus camera distance
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenAnchor {
    pub u: f64,
    pub v: f64,
    pub distance: f64,
}

impl ScreenAnchor {
    pub fn new(u: f64, v: f64, distance: f64) -> Self {
        Self { u, v, distance }
    }

    fn validate(&self) -> Result<(), DomainError> {
        if !(self.u.is_finite() && self.v.is_finite() && self.distance.is_finite()) {
            return Err(DomainError::NonFinite("screen anchor"));
        }
        if self.distance <= 0.0 {
            return Err(DomainError::ZeroLength(self.distance));
        }
        Ok(())
    }
}

/// World-space result for one anchor
#[derive(Clone, Debug, PartialEq)]
pub struct AnchorPlacement {
    pub position: DVec3,
    pub status: Status,
}

/// World point `anchor.distance` away from the camera along the ray through
/// the anchor's screen position
pub fn project_anchor(camera: &Camera, anchor: &ScreenAnchor) -> Result<DVec3, EngineError> {
    anchor.validate()?;
    if !camera.is_valid() {
        return Err(EngineError::NumericInstability(
            "camera is not usable for unprojection".into(),
        ));
    }

    let ray = camera.unproject_ray(anchor.u, anchor.v).ok_or_else(|| {
        EngineError::NumericInstability(format!(
            "no ray through screen point ({}, {})",
            anchor.u, anchor.v
        ))
    })?;

    let position = camera.position + ray * anchor.distance;
    if !position.is_finite() {
        return Err(EngineError::NumericInstability(format!(
            "anchor ({}, {}) unprojected to a non-finite point",
            anchor.u, anchor.v
        )));
    }
    Ok(position)
}

/// Named anchors with cached placements
#[derive(Debug, Default)]
pub struct ScreenAnchorProjector {
    anchors: Vec<(String, ScreenAnchor)>,
    /// `None` until the anchor has been through a successful refresh
    placements: Vec<Option<DVec3>>,
    last_camera: Option<Camera>,
    status: Status,
}

impl ScreenAnchorProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-off placement. A failed projection falls back to the point
    /// straight ahead of the camera (or the origin if the camera itself is
    /// broken) with a degraded status.
    pub fn place(&self, camera: &Camera, anchor: &ScreenAnchor) -> AnchorPlacement {
        match project_anchor(camera, anchor) {
            Ok(position) => AnchorPlacement {
                position,
                status: Status::Nominal,
            },
            Err(e) => {
                tracing::warn!("Anchor projection failed: {}", e);
                let ahead = camera.position + camera.forward() * anchor.distance.abs();
                AnchorPlacement {
                    position: if ahead.is_finite() { ahead } else { DVec3::ZERO },
                    status: e.into(),
                }
            }
        }
    }

    /// Register or replace an anchor. Placements are recomputed on the next
    /// refresh.
    pub fn insert(&mut self, name: impl Into<String>, anchor: ScreenAnchor) -> Status {
        let name = name.into();
        if let Err(e) = anchor.validate() {
            tracing::warn!("Rejected anchor '{}': {}", name, e);
            return e.into();
        }

        match self.anchors.iter().position(|(n, _)| *n == name) {
            Some(index) => {
                self.anchors[index].1 = anchor;
                self.placements[index] = None;
            }
            None => {
                self.anchors.push((name, anchor));
                self.placements.push(None);
            }
        }
        self.last_camera = None;
        Status::Nominal
    }

    pub fn remove(&mut self, name: &str) -> Option<ScreenAnchor> {
        let index = self.anchors.iter().position(|(n, _)| n == name)?;
        self.placements.remove(index);
        Some(self.anchors.remove(index).1)
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    /// Recompute placements if the camera changed since the last refresh.
    /// Returns true when placements were recomputed.
    ///
    /// With an unusable camera the previous placements are kept and the
    /// next refresh tries again.
    pub fn refresh(&mut self, camera: &Camera) -> bool {
        if self.last_camera.as_ref() == Some(camera) {
            return false;
        }

        let computed: Result<Vec<Option<DVec3>>, EngineError> = self
            .anchors
            .iter()
            .map(|(_, anchor)| project_anchor(camera, anchor).map(Some))
            .collect();

        match computed {
            Ok(placements) => {
                self.placements = placements;
                self.last_camera = Some(*camera);
                self.status = Status::Nominal;
                tracing::debug!("Recomputed {} screen anchors", self.placements.len());
                true
            }
            Err(e) => {
                tracing::error!("Screen anchors kept from previous frame: {}", e);
                self.last_camera = None;
                self.status = e.into();
                false
            }
        }
    }

    pub fn placement(&self, name: &str) -> Option<DVec3> {
        let index = self.anchors.iter().position(|(n, _)| n == name)?;
        self.placements.get(index).copied().flatten()
    }

    /// Anchors that currently have a placement
    pub fn placements(&self) -> impl Iterator<Item = (&str, DVec3)> + '_ {
        self.anchors
            .iter()
            .zip(self.placements.iter())
            .filter_map(|((name, _), pos)| pos.map(|p| (name.as_str(), p)))
    }

    /// Status of the most recent refresh
    pub fn status(&self) -> &Status {
        &self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_anchor_projects_back_to_screen_point() {
        let camera = Camera::default();
        for (u, v) in [(0.5, 0.5), (0.1, 0.2), (0.85, 0.9), (0.25, 0.75)] {
            let anchor = ScreenAnchor::new(u, v, 1.5);
            let pos = project_anchor(&camera, &anchor).unwrap();
            assert_abs_diff_eq!((pos - camera.position).length(), 1.5, epsilon = 1e-9);

            let (pu, pv, _) = camera.project(pos).unwrap();
            assert_abs_diff_eq!(pu, u, epsilon = 1e-9);
            assert_abs_diff_eq!(pv, v, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_invalid_anchor_rejected() {
        let mut projector = ScreenAnchorProjector::new();
        assert!(projector.insert("bad", ScreenAnchor::new(0.5, f64::NAN, 1.0)).is_degraded());
        assert!(projector.insert("behind", ScreenAnchor::new(0.5, 0.5, -1.0)).is_degraded());
        assert!(projector.is_empty());
    }

    #[test]
    fn test_refresh_only_when_camera_moves() {
        let mut projector = ScreenAnchorProjector::new();
        projector.insert("caption", ScreenAnchor::new(0.2, 0.8, 2.0));

        let mut camera = Camera::default();
        assert!(projector.refresh(&camera));
        assert!(!projector.refresh(&camera));
        let before = projector.placement("caption").unwrap();

        camera.orbit(0.3, 0.0);
        assert!(projector.refresh(&camera));
        let after = projector.placement("caption").unwrap();
        assert!((after - before).length() > 1e-3);
    }

    #[test]
    fn test_broken_camera_keeps_placements() {
        let mut projector = ScreenAnchorProjector::new();
        projector.insert("caption", ScreenAnchor::new(0.2, 0.8, 2.0));
        let camera = Camera::default();
        projector.refresh(&camera);
        let before = projector.placement("caption").unwrap();

        let mut broken = camera;
        broken.position = DVec3::splat(f64::INFINITY);
        assert!(!projector.refresh(&broken));
        assert_eq!(projector.placement("caption"), Some(before));
        assert!(matches!(projector.status().error(), Some(EngineError::NumericInstability(_))));

        assert!(projector.refresh(&camera));
        assert!(projector.status().is_nominal());
    }

    #[test]
    fn test_no_placement_before_first_refresh() {
        let mut projector = ScreenAnchorProjector::new();
        projector.insert("caption", ScreenAnchor::new(0.2, 0.8, 2.0));
        assert_eq!(projector.placement("caption"), None);
        assert_eq!(projector.placements().count(), 0);

        let camera = Camera::default();
        projector.refresh(&camera);
        let placed = projector.placement("caption").unwrap();

        // Replacing an anchor drops its stale placement
        projector.insert("caption", ScreenAnchor::new(0.7, 0.3, 2.0));
        assert_eq!(projector.placement("caption"), None);
        projector.refresh(&camera);
        assert_ne!(projector.placement("caption"), Some(placed));

        // A failed refresh leaves a new anchor unplaced
        let mut broken = camera;
        broken.position = DVec3::splat(f64::NAN);
        projector.insert("late", ScreenAnchor::new(0.5, 0.5, 1.0));
        assert!(!projector.refresh(&broken));
        assert_eq!(projector.placement("late"), None);
        assert!(projector.placement("caption").is_some());
    }

    #[test]
    fn test_replace_and_remove() {
        let mut projector = ScreenAnchorProjector::new();
        projector.insert("a", ScreenAnchor::new(0.1, 0.1, 1.0));
        projector.insert("b", ScreenAnchor::new(0.9, 0.1, 1.0));
        projector.insert("a", ScreenAnchor::new(0.5, 0.5, 1.0));
        assert_eq!(projector.len(), 2);

        let camera = Camera::default();
        projector.refresh(&camera);
        let a = projector.placement("a").unwrap();
        assert_abs_diff_eq!(a.x, 0.0, epsilon = 1e-9);

        assert!(projector.remove("a").is_some());
        assert!(projector.placement("a").is_none());
        assert_eq!(projector.placements().count(), 1);
    }

    #[test]
    fn test_place_falls_back_ahead_of_camera() {
        let projector = ScreenAnchorProjector::new();
        let mut camera = Camera::default();
        camera.fov_y = 0.0;
        let placement = projector.place(&camera, &ScreenAnchor::new(0.3, 0.3, 2.0));
        assert!(placement.status.is_degraded());
        assert_abs_diff_eq!(placement.position.z, 1.0, epsilon = 1e-9);
    }
}

//! Builds a [`ReportPayload`] from an [`ExposureContext`].

use chrono::{DateTime, Utc};

use super::context::ExposureContext;
use super::payload::{
    EquipmentPayload, ImagePayload, ReportPayload, StatisticsPayload, TargetPayload,
};
use super::thumbnail::encode_thumbnail;
use crate::capture::{Frame, FrameSource, USE_CAMERA_DEFAULT};

/// Build the report for `context`, stamped with the current time
pub fn build_payload(context: &ExposureContext) -> ReportPayload {
    build_payload_at(context, Utc::now())
}

/// Build the report for `context` with an explicit timestamp.
///
/// Never fails: a thumbnail that cannot be produced is logged and left out.
pub fn build_payload_at(context: &ExposureContext, captured_at: DateTime<Utc>) -> ReportPayload {
    let camera = context.camera.as_ref();
    let gain = resolve_camera_setting(context.exposure.gain, camera.map(|c| c.gain));
    let offset = resolve_camera_setting(context.exposure.offset, camera.map(|c| c.offset));

    let rms = context.guiding_rms.map(|rms| rms.arcseconds());
    let statistics = context.star_statistics.map(|stats| StatisticsPayload {
        hfr: stats.hfr,
        stars: stats.stars,
        mean: stats.mean,
        median: stats.median,
        rms,
    });

    ReportPayload {
        target: TargetPayload {
            name: context.target.name.clone(),
            ra: context.target.coordinates.ra_degrees,
            dec: context.target.coordinates.dec,
            rotation: context.target.rotation,
        },
        equipment: EquipmentPayload {
            camera_name: camera.and_then(|c| c.name.clone()),
            telescope_name: context.telescope_name.clone(),
        },
        image: ImagePayload {
            filter_name: context.filter_name.clone(),
            duration: context.exposure.duration,
            gain,
            offset,
            binning: context.exposure.binning.map(|b| b.to_string()),
            captured_at,
            rms,
            thumbnail: render_thumbnail(context),
            statistics,
        },
    }
}

/// `-1` means "camera default": report what the camera is actually set to
fn resolve_camera_setting(value: i32, camera_value: Option<i32>) -> i32 {
    match (value, camera_value) {
        (USE_CAMERA_DEFAULT, Some(current)) => current,
        _ => value,
    }
}

fn render_thumbnail(context: &ExposureContext) -> Option<String> {
    let result = match &context.frame {
        FrameSource::None => return None,
        FrameSource::Decoded(frame) => encode_thumbnail(frame),
        FrameSource::File(path) => Frame::open(path).and_then(|frame| encode_thumbnail(&frame)),
    };

    match result {
        Ok(thumbnail) => Some(thumbnail),
        Err(e) => {
            tracing::error!(
                source = %context.source,
                target = %context.target.name,
                error = %e,
                "Error creating thumbnail"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{
        Binning, CameraInfo, Coordinates, DeepSkyObject, ExposureParameters, GuidingRms,
        StarStatistics,
    };
    use crate::report::CaptureSource;
    use std::path::PathBuf;

    fn make_test_context() -> ExposureContext {
        ExposureContext {
            source: CaptureSource::ImageSaved,
            target: DeepSkyObject {
                name: "M42".to_string(),
                coordinates: Coordinates {
                    ra_degrees: 83.8,
                    dec: -5.4,
                },
                rotation: 0.0,
            },
            camera: Some(CameraInfo {
                name: Some("ZWO ASI2600MM".to_string()),
                gain: 120,
                offset: 30,
            }),
            telescope_name: Some("RedCat 51".to_string()),
            filter_name: Some("L".to_string()),
            exposure: ExposureParameters {
                duration: 180.0,
                gain: -1,
                offset: 10,
                binning: Some(Binning { x: 1, y: 1 }),
            },
            guiding_rms: Some(GuidingRms {
                total: 1.2,
                scale: 2.0,
            }),
            star_statistics: None,
            frame: FrameSource::None,
        }
    }

    #[test]
    fn test_camera_default_gain_is_replaced() {
        let payload = build_payload(&make_test_context());
        assert_eq!(payload.image.gain, 120);
        assert_eq!(payload.image.offset, 10);
        assert_eq!(payload.image.rms, Some(2.4));
        assert_eq!(payload.image.binning.as_deref(), Some("1x1"));
        assert_eq!(payload.equipment.camera_name.as_deref(), Some("ZWO ASI2600MM"));
    }

    #[test]
    fn test_camera_default_offset_is_replaced() {
        let mut context = make_test_context();
        context.exposure.gain = 200;
        context.exposure.offset = -1;
        let payload = build_payload(&context);
        assert_eq!(payload.image.gain, 200);
        assert_eq!(payload.image.offset, 30);
    }

    #[test]
    fn test_sentinel_kept_without_camera() {
        let mut context = make_test_context();
        context.camera = None;
        let payload = build_payload(&context);
        assert_eq!(payload.image.gain, -1);
        assert!(payload.equipment.camera_name.is_none());
    }

    #[test]
    fn test_rms_absent_without_guiding_data() {
        let mut context = make_test_context();
        context.guiding_rms = None;
        context.star_statistics = Some(StarStatistics {
            hfr: 2.3,
            stars: 512,
            mean: 1400.0,
            median: 1350.0,
        });

        let payload = build_payload(&context);
        assert!(payload.image.rms.is_none());
        let stats = payload.image.statistics.unwrap();
        assert_eq!(stats.stars, 512);
        assert!(stats.rms.is_none());
    }

    #[test]
    fn test_rms_copied_into_statistics() {
        let mut context = make_test_context();
        context.star_statistics = Some(StarStatistics {
            hfr: 2.3,
            stars: 512,
            mean: 1400.0,
            median: 1350.0,
        });
        let payload = build_payload(&context);
        assert_eq!(payload.image.statistics.unwrap().rms, Some(2.4));
    }

    #[test]
    fn test_timestamp_is_build_time() {
        let at = DateTime::parse_from_rfc3339("2024-03-01T22:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let payload = build_payload_at(&make_test_context(), at);
        assert_eq!(payload.image.captured_at, at);
    }

    #[test]
    fn test_thumbnail_from_frame() {
        let mut context = make_test_context();
        context.frame = FrameSource::Decoded(Frame::new(600, 400, vec![1000; 600 * 400]));
        let payload = build_payload(&context);
        assert!(payload.image.thumbnail.is_some());
    }

    #[test]
    fn test_bad_frame_omits_thumbnail_only() {
        let mut context = make_test_context();
        context.frame = FrameSource::Decoded(Frame::new(0, 0, vec![]));
        let payload = build_payload(&context);
        assert!(payload.image.thumbnail.is_none());
        assert_eq!(payload.target.name, "M42");
        assert_eq!(payload.image.gain, 120);

        context.frame = FrameSource::File(PathBuf::from("/nonexistent/light_0001.tif"));
        let payload = build_payload(&context);
        assert!(payload.image.thumbnail.is_none());
    }

    #[test]
    fn test_thumbnail_from_saved_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("light_0001.png");
        image::GrayImage::from_fn(64, 32, |x, _| image::Luma([(x * 4) as u8]))
            .save(&path)
            .unwrap();

        let mut context = make_test_context();
        context.frame = FrameSource::File(path);
        let payload = build_payload(&context);
        assert!(payload.image.thumbnail.is_some());
    }
}

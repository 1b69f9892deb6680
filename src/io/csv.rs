use std::io::{self, Write};

use crate::bus::FlightData;

// ---------------------------------------------------------------------------
// Flight log export
// ---------------------------------------------------------------------------

/// One sampled row of the observable flight state.
///
/// The core itself persists nothing; a log is only ever an export of what
/// the bus signals held at sampling time.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub time: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub course_over_ground: f64,
    pub target_course: f64,
    pub speed_over_ground: f64,
    pub pitch_angle: f64,
    pub roll_angle: f64,
    pub aileron_output: f64,
    pub elevator_output: f64,
    pub roll_angle_preset: f64,
    pub current_waypoint: f64,
}

impl LogRecord {
    /// Snapshot the bus at the given timestamp (seconds).
    pub fn sample(time: f64, bus: &FlightData) -> Self {
        Self {
            time,
            latitude: bus.latitude.get(),
            longitude: bus.longitude.get(),
            course_over_ground: bus.course_over_ground.get(),
            target_course: bus.target_course.get(),
            speed_over_ground: bus.speed_over_ground.get(),
            pitch_angle: bus.pitch_angle.get(),
            roll_angle: bus.roll_angle.get(),
            aileron_output: bus.aileron_output.get(),
            elevator_output: bus.elevator_output.get(),
            roll_angle_preset: bus.roll_angle_preset.get(),
            current_waypoint: bus.current_waypoint_index.get(),
        }
    }
}

/// Write a flight log to CSV format.
///
/// Columns: time, latitude, longitude, course, target_course, speed,
///          pitch_deg, roll_deg, aileron_out, elevator_out,
///          roll_preset_deg, waypoint
pub fn write_log<W: Write>(writer: &mut W, records: &[LogRecord]) -> io::Result<()> {
    writeln!(
        writer,
        "time,latitude,longitude,course,target_course,speed,\
         pitch_deg,roll_deg,aileron_out,elevator_out,roll_preset_deg,waypoint"
    )?;

    for r in records {
        writeln!(
            writer,
            "{:.2},{:.7},{:.7},{:.2},{:.2},{:.2},{:.2},{:.2},{:.4},{:.4},{:.2},{}",
            r.time,
            r.latitude,
            r.longitude,
            r.course_over_ground,
            r.target_course,
            r.speed_over_ground,
            r.pitch_angle,
            r.roll_angle,
            r.aileron_output,
            r.elevator_output,
            r.roll_angle_preset,
            r.current_waypoint as i64,
        )?;
    }

    Ok(())
}

/// Write a flight log to a CSV file at the given path.
pub fn write_log_file(path: &str, records: &[LogRecord]) -> io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    write_log(&mut file, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::SignalNet;

    #[test]
    fn csv_output_has_header_and_rows() {
        let net = SignalNet::new();
        let bus = FlightData::new(&net);
        bus.latitude.set(47.3769);
        bus.longitude.set(8.5417);
        bus.course_over_ground.set(90.0);
        bus.current_waypoint_index.set(2.0);

        let records = vec![LogRecord::sample(0.0, &bus), LogRecord::sample(0.1, &bus)];

        let mut buf = Vec::new();
        write_log(&mut buf, &records).unwrap();
        let output = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[0].starts_with("time,latitude,"));
        assert_eq!(lines.len(), 3); // header + 2 data rows
        assert!(lines[1].starts_with("0.00,47.3769000,"));
        assert!(lines[1].ends_with(",2"));
    }
}

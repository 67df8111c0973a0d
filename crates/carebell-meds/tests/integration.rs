use carebell_accounts::{sign_up, NewUser};
use carebell_db::{create_pool, run_migrations, DbRuntimeSettings};
use carebell_meds::{
    create_medication, day_counts, list_active_reminders, record_dose, set_reminder_active,
    NewMedication,
};
use carebell_types::DoseStatus;
use chrono::{TimeZone, Utc};

fn medication(name: &str, time: &str) -> NewMedication {
    NewMedication {
        name: name.to_string(),
        dose: "1 tablet".to_string(),
        instructions: None,
        time: time.to_string(),
        days: None,
    }
}

#[test]
fn schedule_and_logs_round_trip_through_a_file_database() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("meds.db");
    let path = path.to_str().expect("temp path should be utf-8");

    let pool = create_pool(path, DbRuntimeSettings::default()).expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");
    run_migrations(&conn).expect("failed to run migrations");

    let user = sign_up(
        &conn,
        &NewUser {
            email: "arthur@example.com".to_string(),
            password: "crossword".to_string(),
            name: "Arthur".to_string(),
            phone: None,
        },
    )
    .expect("sign up should succeed");

    let morning = create_medication(&conn, &user.id, &medication("Levothyroxine", "07:30"))
        .expect("create should succeed");
    let night = create_medication(&conn, &user.id, &medication("Melatonin", "22:00"))
        .expect("create should succeed");
    assert_eq!(morning.reminder.days_of_week, "1,2,3,4,5,6,7");

    let at = Utc.with_ymd_and_hms(2026, 3, 2, 7, 45, 0).unwrap();
    record_dose(&conn, &user.id, &morning.reminder.id, DoseStatus::Completed, at)
        .expect("log should succeed");
    record_dose(&conn, &user.id, &night.reminder.id, DoseStatus::Missed, at)
        .expect("log should succeed");
    drop(conn);

    let other = pool.get().expect("failed to get connection");
    let counts = day_counts(&other, &user.id, at.date_naive()).expect("counts should succeed");
    assert_eq!((counts.completed, counts.missed), (1, 1));

    set_reminder_active(&other, &user.id, &night.reminder.id, false)
        .expect("deactivate should succeed");
    let active = list_active_reminders(&other, &user.id, Some(5)).expect("list should succeed");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].medication.name, "Levothyroxine");
    assert_eq!(active[0].scheduled_dose().scheduled_time, "07:30");

    // Logs stay attached to a deactivated reminder.
    let counts = day_counts(&other, &user.id, at.date_naive()).expect("counts should succeed");
    assert_eq!(counts.missed, 1);

    other
        .execute("DELETE FROM users WHERE id = ?1", [&user.id])
        .expect("delete should succeed");
    let logs: i64 = other
        .query_row("SELECT COUNT(*) FROM reminder_logs", [], |row| row.get(0))
        .expect("count should succeed");
    assert_eq!(logs, 0, "logs cascade with their user");
}

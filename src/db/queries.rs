pub const SELECT_TRIPS_BY_BOAT: &str = r#"
SELECT trip_id, boat_id, name, start_date, end_date
FROM trips
WHERE boat_id = $1
ORDER BY start_date DESC;
"#;

pub const SELECT_DATAPOINTS_BY_TRIP: &str = r#"
SELECT datapoint_id, trip_id, timestamp, data
FROM datapoints
WHERE trip_id = $1
ORDER BY timestamp ASC;
"#;

pub const UPSERT_TRIP: &str = r#"
INSERT INTO trips (trip_id, boat_id, name, start_date, end_date)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (trip_id) DO UPDATE
SET name = $3,
    start_date = $4,
    end_date = $5;
"#;

pub const INSERT_DATAPOINT: &str = r#"
INSERT INTO datapoints (datapoint_id, trip_id, timestamp, data)
VALUES ($1, $2, $3, $4);
"#;

pub const SELECT_USER_BY_USERNAME: &str = r#"
SELECT user_id, username FROM users WHERE username = $1 LIMIT 1;
"#;

pub const SELECT_BOAT_FOR_USER: &str = r#"
SELECT b.boat_id, b.emblem
FROM boats b
JOIN user_boats ub ON ub.boat_id = b.boat_id
WHERE ub.user_id = $1 AND b.emblem = $2
LIMIT 1;
"#;

pub const SELECT_BOAT_BY_EMBLEM: &str = r#"
SELECT boat_id, emblem FROM boats WHERE emblem = $1 LIMIT 1;
"#;

pub const SELECT_ACCESS_TOKEN: &str = r#"
SELECT kind, identifier
FROM access_tokens
WHERE token = $1 AND (expires_at IS NULL OR expires_at > NOW());
"#;

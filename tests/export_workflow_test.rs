use fire_gama::export::{ExportConfig, Exporter, InputSource, OutputTarget};
use fire_gama::{Error, ReferenceStore};

use std::fs;
use std::io::{BufReader, Cursor};
use std::path::Path;
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
    "srids": [{"sridid": 4, "name": "EPSG:5799", "description": "DVR90"}],
    "points": [
        {
            "id": "p-g1",
            "info": [{"infotype": "IDENT:GI", "text": "G.1"}],
            "geometry": "POINT (10.0 56.0)",
            "coordinates": [{"sridid": 4, "z": 20.5, "sz": 0.2}]
        },
        {
            "id": "p-k1",
            "info": [{"infotype": "IDENT:landsnr", "text": "K-01-1"}],
            "geometry": "POINT (10.1 56.1)",
            "coordinates": [{"sridid": 4, "z": 21.0, "sz": 0.5, "valid_to": "2019-01-01"}]
        },
        {
            "id": "p-k2",
            "info": [{"infotype": "IDENT:landsnr", "text": "K-01-2"}],
            "geometry": "POINT (10.2 56.2)"
        }
    ]
}"#;

const FIELD_FILE: &str = "\
Levelling KDI2018 west
# G.1    K-01-1 10:15 x 1000.0  0.50000 J100 x 10
# K-01-1 K-01-2 10:45 x  250.0 -0.25000-557 J100 x 4
end of file
";

fn config_in(dir: &Path) -> ExportConfig {
    ExportConfig {
        points_path: dir.join("punkter.geojson"),
        observations_path: dir.join("observationer.geojson"),
        ..ExportConfig::default()
    }
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_full_export_workflow() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let input_path = temp_dir.path().join("KDI2018vest.txt");
    fs::write(&input_path, FIELD_FILE)?;

    let store = ReferenceStore::from_json(SNAPSHOT)?;
    let exporter = Exporter::new(&store, config_in(temp_dir.path()));

    let input_name = input_path.to_string_lossy().into_owned();
    let output = OutputTarget::default_for(&input_name);
    let file = fs::File::open(&input_path)?;
    let summary = exporter.run(vec![InputSource::new(input_name, BufReader::new(file))], &output)?;

    assert_eq!(summary.points, 3);
    assert_eq!(summary.fixed_points, 1);
    assert_eq!(summary.observations, 2);
    assert_eq!(summary.sentinel_endpoints, 0);
    assert_eq!(summary.points_path, temp_dir.path().join("punkter.geojson"));
    assert_eq!(summary.observations_path, temp_dir.path().join("observationer.geojson"));
    assert_eq!(summary.output, OutputTarget::File(temp_dir.path().join("KDI2018vest.xml")));

    // Points in identifier order
    let points = read_json(&temp_dir.path().join("punkter.geojson"));
    let features = points["Features"].as_array().unwrap();
    assert_eq!(features.len(), 3);
    let ids: Vec<&str> = features
        .iter()
        .map(|f| f["properties"]["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["G.1", "K-01-1", "K-01-2"]);
    assert_eq!(features[0]["properties"]["H"], 20.5);
    // superseded elevation is not used
    assert_eq!(features[1]["properties"]["H"], 0.0);
    assert_eq!(features[1]["properties"]["sH"], 0.0);

    let observations = read_json(&temp_dir.path().join("observationer.geojson"));
    let lines = observations["Features"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["properties"]["dH"], -0.25);
    assert_eq!(lines[1]["properties"]["setups"], 4);
    assert_eq!(lines[1]["properties"]["journal"], "J100");
    assert_eq!(
        lines[0]["geometry"]["coordinates"],
        serde_json::json!([[10.0, 56.0], [10.1, 56.1]])
    );

    let xml_path = temp_dir.path().join("KDI2018vest.xml");
    let xml = fs::read_to_string(&xml_path)?;
    assert_eq!(xml.matches("<point ").count(), 3);
    assert_eq!(xml.matches("<dh ").count(), 2);

    let fixed = xml.find(r#"<point fix="Z" id="G.1" z="20.5"/>"#).unwrap();
    let adjusted = xml.find(r#"<point adj="z" id="K-01-1" z="0"/>"#).unwrap();
    let first_dh = xml
        .find(r#"<dh from="G.1" to="K-01-1" val="+0.50000" dist="1.00000" stdev="0.70"/>"#)
        .unwrap();
    let second_dh = xml
        .find(r#"<dh from="K-01-1" to="K-01-2" val="-0.25000" dist="0.25000" stdev="0.34"/>"#)
        .unwrap();
    assert!(fixed < adjusted && adjusted < first_dh && first_dh < second_dh);

    Ok(())
}

#[test]
fn test_multiple_inputs_share_one_network() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let store = ReferenceStore::from_json(SNAPSHOT)?;
    let exporter = Exporter::new(&store, config_in(temp_dir.path()));

    let inputs = vec![
        InputSource::new("a.txt", Cursor::new("# G.1 K-01-1 x x 100 0.1 J1 x 2\n")),
        InputSource::new("b.txt", Cursor::new("# K-01-1 G.1 x x 100 -0.1 J2 x 2\n")),
    ];
    let output = OutputTarget::File(temp_dir.path().join("out.xml"));
    let summary = exporter.run(inputs, &output)?;

    assert_eq!(summary.points, 2);
    assert_eq!(summary.observations, 2);
    Ok(())
}

#[test]
fn test_unknown_point_aborts_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let store = ReferenceStore::from_json(SNAPSHOT).unwrap();
    let exporter = Exporter::new(&store, config_in(temp_dir.path()));

    let inputs = vec![InputSource::new(
        "net.txt",
        Cursor::new("# G.1 K-99-9 x x 100 0.1 J1 x 2\n"),
    )];
    let output = OutputTarget::File(temp_dir.path().join("out.xml"));
    let err = exporter.run(inputs, &output).unwrap_err();

    assert!(matches!(err, Error::PointNotFound { ref ident } if ident == "K-99-9"));
    assert!(err.to_string().contains("K-99-9"));
    assert!(!temp_dir.path().join("punkter.geojson").exists());
    assert!(!temp_dir.path().join("out.xml").exists());
}

#[test]
fn test_malformed_line_aborts_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let store = ReferenceStore::from_json(SNAPSHOT).unwrap();
    let exporter = Exporter::new(&store, config_in(temp_dir.path()));

    let inputs = vec![InputSource::new(
        "net.txt",
        Cursor::new("# G.1 K-01-1 x x 100 0.1 J1 x 2\n# G.1 K-01-2 100 0.1\n"),
    )];
    let output = OutputTarget::File(temp_dir.path().join("out.xml"));
    let err = exporter.run(inputs, &output).unwrap_err();

    match err {
        Error::MalformedInput { line } => assert_eq!(line, "G.1 K-01-2 100 0.1"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!temp_dir.path().join("observationer.geojson").exists());
}

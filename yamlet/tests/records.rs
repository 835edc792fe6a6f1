use std::collections::BTreeMap;

use yamlet::{
    from_str, to_string, yaml_record, yaml_via_marshaler, DenyError, EmitError, Marshaler,
    NodeType, ReadError, Timestamp, Unmarshaler,
};

#[derive(Debug, Default, PartialEq)]
struct Limits {
    cpu: f64,
    memory: u32,
}

yaml_record!(Limits {
    cpu => "cpu",
    memory => "memory",
});

#[derive(Debug, PartialEq)]
struct Service {
    name: String,
    replicas: u8,
    ports: Vec<u16>,
    labels: BTreeMap<String, String>,
    limits: Option<Limits>,
    enabled: bool,
}

yaml_record!(Service {
    name => "name",
    replicas => "replicas",
    ports => "ports" (omit_empty),
    labels => "labels" (omit_empty),
    limits => "limits",
    enabled => "enabled" (omit_empty),
});

/// A color written `#rrggbb`.
#[derive(Debug, PartialEq)]
struct Color(u8, u8, u8);

impl Marshaler for Color {
    fn marshal_yaml(&self) -> Result<Vec<u8>, EmitError> {
        Ok(format!("'#{:02x}{:02x}{:02x}'", self.0, self.1, self.2).into_bytes())
    }
}

impl Unmarshaler for Color {
    fn unmarshal_yaml(raw: &[u8]) -> Result<Self, ReadError> {
        let text: String = yamlet::from_slice(raw)?;
        let hex = text
            .strip_prefix('#')
            .filter(|hex| hex.len() == 6)
            .ok_or_else(|| ReadError::custom(format!("`{text}` is not a color")))?;
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|e| ReadError::custom(e.to_string()))
        };
        Ok(Color(channel(0)?, channel(2)?, channel(4)?))
    }
}

yaml_via_marshaler!(Color);

#[derive(Debug, PartialEq)]
struct Theme {
    background: Color,
    accents: Vec<Color>,
    updated: Option<Timestamp>,
}

yaml_record!(Theme {
    background => "background",
    accents => "accents",
    updated => "updated",
});

#[test]
fn test_decode_record() {
    let service: Service = from_str(
        "
name: web
replicas: 3
ports: [80, 443]
labels:
  tier: frontend
limits:
  cpu: 0.5
  memory: 512
unknown: [ignored, {nested: true}]
enabled: true
",
    )
    .unwrap();
    assert_eq!(
        service,
        Service {
            name: "web".to_owned(),
            replicas: 3,
            ports: vec![80, 443],
            labels: BTreeMap::from([("tier".to_owned(), "frontend".to_owned())]),
            limits: Some(Limits {
                cpu: 0.5,
                memory: 512
            }),
            enabled: true,
        }
    );
}

#[test]
fn test_missing_fields() {
    let service: Service = from_str("name: db\nreplicas: 1").unwrap();
    assert!(service.ports.is_empty());
    assert!(service.labels.is_empty());
    assert_eq!(service.limits, None);
    assert!(!service.enabled);

    let error = from_str::<Service>("replicas: 1").unwrap_err();
    assert_eq!(error.to_string(), "missing field `name`");
}

#[test]
fn test_every_bad_field_is_reported() {
    let error = from_str::<Service>("name: [x]\nreplicas: 300\nports: [http]").unwrap_err();
    let ReadError::Joined(errors) = &error else {
        panic!("{error:?}");
    };
    assert_eq!(errors.0.len(), 3);
    assert_eq!(
        errors.0[0],
        ReadError::Deny(DenyError {
            expecter_name: "string",
            node_type: NodeType::Sequence
        })
    );
    assert!(matches!(
        &errors.0[1],
        ReadError::OutOfRange { text, .. } if text == "300"
    ));
    assert_eq!(
        errors.0[2],
        ReadError::Deny(DenyError {
            expecter_name: "unsigned",
            node_type: NodeType::Text
        })
    );
}

#[test]
fn test_encode_record() {
    let service = Service {
        name: "api".to_owned(),
        replicas: 2,
        ports: vec![8080],
        labels: BTreeMap::new(),
        limits: None,
        enabled: false,
    };
    assert_eq!(
        to_string(&service).unwrap(),
        "---\nname: api\nreplicas: 2\nports:\n  - 8080\nlimits: ~\n...\n"
    );

    let service = Service {
        limits: Some(Limits::default()),
        enabled: true,
        ports: vec![],
        ..service
    };
    assert_eq!(
        to_string(&service).unwrap(),
        "---\nname: api\nreplicas: 2\nlimits:\n  cpu: 0.0\n  memory: 0\nenabled: true\n...\n"
    );
}

#[test]
fn test_record_round_trip() {
    let service = Service {
        name: "yes".to_owned(),
        replicas: 0,
        ports: vec![1, 2],
        labels: BTreeMap::from([("1.0".to_owned(), "~".to_owned())]),
        limits: Some(Limits {
            cpu: 1.5,
            memory: 64,
        }),
        enabled: true,
    };
    let text = to_string(&service).unwrap();
    assert_eq!(from_str::<Service>(&text), Ok(service));
}

#[test]
fn test_marshaler() {
    let theme: Theme = from_str(
        "background: '#102030'\naccents:\n  - '#ff0000'\n  - '#00ff00'\nupdated: 2024-05-01",
    )
    .unwrap();
    assert_eq!(theme.background, Color(0x10, 0x20, 0x30));
    assert_eq!(theme.accents, [Color(255, 0, 0), Color(0, 255, 0)]);
    assert_eq!(theme.updated.as_ref().map(Timestamp::date), Some((2024, 5, 1)));

    let text = to_string(&theme).unwrap();
    assert_eq!(
        text,
        "---\nbackground: '#102030'\naccents:\n  - '#ff0000'\n  - '#00ff00'\nupdated: !!timestamp 2024-05-01\n...\n"
    );
    assert_eq!(from_str::<Theme>(&text), Ok(theme));

    let error = from_str::<Theme>("background: red\naccents: []\nupdated: ~").unwrap_err();
    assert_eq!(error, ReadError::Custom("`red` is not a color".to_owned()));
}

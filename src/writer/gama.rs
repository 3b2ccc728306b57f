//! GNU Gama `gama-local` input for height network adjustment.

use std::collections::BTreeMap;
use std::io::Write;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::Result;
use crate::feature::ObservationFeature;
use crate::model::{PointClass, ResolvedPoint};

const NETWORK_ATTRIBUTES: [(&str, &str); 3] = [
    ("angles", "left-handed"),
    ("axes-xy", "en"),
    ("epoch", "0.0"),
];

const PARAMETER_ATTRIBUTES: [(&str, &str); 10] = [
    ("algorithm", "gso"),
    ("angles", "400"),
    ("conf-pr", "0.95"),
    ("cov-band", "0"),
    ("ellipsoid", "grs80"),
    ("latitude", "55.7"),
    ("sigma-act", "apriori"),
    ("sigma-apr", "1.0"),
    ("tol-abs", "1000.0"),
    ("update-constrained-coordinates", "no"),
];

/// A priori standard deviation of a levelled height difference.
///
/// `dist_km` is the levelled distance in kilometres.
pub fn observation_stdev(dist_km: f64, setups: u32) -> f64 {
    // TODO: pick the expression by survey method once the field files carry it
    dist_km.sqrt() * 0.6 + 0.01 * f64::from(setups)
}

/// Streams a `gama-local` document to `W`.
pub struct GamaWriter<W: Write> {
    xml: Writer<W>,
}

impl<W: Write> GamaWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            xml: Writer::new_with_indent(inner, b' ', 2),
        }
    }

    /// Write the complete document and hand back the underlying writer.
    ///
    /// Points whose identifier starts with `fixed_prefix` are held fixed,
    /// all others are adjusted. `points` is iterated in key order for both
    /// sections.
    pub fn write(
        mut self,
        description: &str,
        fixed_prefix: &str,
        points: &BTreeMap<String, ResolvedPoint>,
        observations: &[ObservationFeature],
    ) -> Result<W> {
        // Fixed network parameters and description
        self.preamble()?;
        self.description(description)?;
        self.start("points-observations")?;

        // Control points first, then the points to adjust
        self.comment("Fixed")?;
        for point in points.values() {
            if PointClass::of(&point.ident, fixed_prefix) == PointClass::Fixed {
                self.point(PointClass::Fixed, point)?;
            }
        }
        self.comment("Adjusted")?;
        for point in points.values() {
            if PointClass::of(&point.ident, fixed_prefix) == PointClass::Adjusted {
                self.point(PointClass::Adjusted, point)?;
            }
        }

        // Observations
        self.start("height-differences")?;
        for obs in observations {
            self.height_difference(obs)?;
        }
        self.end("height-differences")?;

        // Close the open elements
        self.end("points-observations")?;
        self.end("network")?;
        self.end("gama-local")?;
        Ok(self.xml.into_inner())
    }

    fn preamble(&mut self) -> Result<()> {
        self.xml
            .write_event(Event::Decl(BytesDecl::new("1.0", None, None)))?;
        self.start("gama-local")?;

        let mut network = BytesStart::new("network");
        network.extend_attributes(NETWORK_ATTRIBUTES);
        self.xml.write_event(Event::Start(network))?;

        let mut parameters = BytesStart::new("parameters");
        parameters.extend_attributes(PARAMETER_ATTRIBUTES);
        self.xml.write_event(Event::Empty(parameters))?;
        Ok(())
    }

    fn description(&mut self, text: &str) -> Result<()> {
        self.start("description")?;
        self.xml.write_event(Event::Text(BytesText::new(text)))?;
        self.end("description")
    }

    fn point(&mut self, class: PointClass, point: &ResolvedPoint) -> Result<()> {
        let mut elem = BytesStart::new("point");
        match class {
            PointClass::Fixed => elem.push_attribute(("fix", "Z")),
            PointClass::Adjusted => elem.push_attribute(("adj", "z")),
        }
        elem.push_attribute(("id", point.ident.as_str()));
        elem.push_attribute(("z", point.elevation.to_string().as_str()));
        self.xml.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn height_difference(&mut self, obs: &ObservationFeature) -> Result<()> {
        let props = &obs.properties;
        let dist_km = props.dist / 1000.0;
        let stdev = observation_stdev(dist_km, props.setups);

        let mut elem = BytesStart::new("dh");
        elem.push_attribute(("from", props.fra.as_str()));
        elem.push_attribute(("to", props.til.as_str()));
        elem.push_attribute(("val", format!("{:+.5}", props.dh).as_str()));
        elem.push_attribute(("dist", format!("{:.5}", dist_km).as_str()));
        elem.push_attribute(("stdev", format!("{:.2}", stdev).as_str()));
        self.xml.write_event(Event::Empty(elem))?;
        Ok(())
    }

    fn comment(&mut self, text: &str) -> Result<()> {
        self.xml
            .write_event(Event::Comment(BytesText::new(&format!(" {text} "))))?;
        Ok(())
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}
